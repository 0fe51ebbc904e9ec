//! Writes expansions back into the source they were attached in.

use tracing::{debug, info};
use witness_core::output::Placement;
use witness_core::{expand_with, render_indented, PrettyOptions, WitnessOptions};

use crate::parser::{parse_file, SourceDeclaration};

/// One expansion that was applied to a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedExpansion {
    pub attribute: String,
    pub declaration: String,
    pub placement: Placement,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandedSource {
    pub text: String,
    pub expansions: Vec<AppliedExpansion>,
}

impl ExpandedSource {
    pub fn is_unchanged(&self) -> bool {
        self.expansions.is_empty()
    }
}

/// Replace `start..end` with `insert`.
#[derive(Debug)]
struct Edit {
    start: usize,
    end: usize,
    insert: String,
    seq: usize,
}

fn line_start(source: &str, offset: usize) -> usize {
    source[..offset].rfind('\n').map_or(0, |index| index + 1)
}

/// Range covering an attribute, widened to its whole line when nothing else
/// shares the line, otherwise to the spaces after it.
fn attribute_removal(source: &str, start: usize, end: usize) -> (usize, usize) {
    let line = line_start(source, start);
    let after = &source[end..];
    let trailing = after.len() - after.trim_start_matches([' ', '\t']).len();
    let alone_before = source[line..start].trim().is_empty();
    let alone_after = after[trailing..].starts_with('\n') || after[trailing..].is_empty();
    if alone_before && alone_after {
        let newline = usize::from(after[trailing..].starts_with('\n'));
        (line, end + trailing + newline)
    } else if alone_after {
        let before = &source[..start];
        let leading = before.len() - before.trim_end_matches([' ', '\t']).len();
        (start - leading, end + trailing)
    } else {
        (start, end + trailing)
    }
}

fn indent(options: &PrettyOptions, levels: usize) -> String {
    " ".repeat(options.indent_size * levels)
}

/// Text to insert for a member expansion of `decl`.
fn member_insertion(
    source: &str,
    decl: &SourceDeclaration,
    rendered: &str,
    options: &PrettyOptions,
) -> (usize, String) {
    let close = decl.body_close;
    let line = line_start(source, close);
    if source[line..close].trim().is_empty() {
        (line, format!("\n{rendered}"))
    } else {
        (close, format!("\n{rendered}{}", indent(options, decl.depth)))
    }
}

/// Expand every attachment attribute in `source` and splice the generated
/// declarations back in. Attachment attributes are removed from the result,
/// so expanding the output again is a no-op.
pub fn expand_source(
    source: &str,
    defaults: &WitnessOptions,
    options: &PrettyOptions,
) -> witness_core::Result<ExpandedSource> {
    let declarations = parse_file(source)?;
    let mut edits = Vec::new();
    let mut expansions = Vec::new();

    for decl in declarations.iter().flat_map(SourceDeclaration::walk) {
        for attachment in &decl.attachments {
            let expansion = expand_with(&decl.decl, &attachment.site, defaults)?;
            debug!(
                attribute = %attachment.site.attribute,
                declaration = %decl.decl.name,
                "splicing expansion"
            );

            let (start, end) = attribute_removal(
                source,
                attachment.span.lo as usize,
                attachment.span.hi as usize,
            );
            edits.push(Edit {
                start,
                end,
                insert: String::new(),
                seq: edits.len(),
            });

            let (at, insert) = match expansion.placement {
                Placement::Peer => {
                    let rendered = render_indented(&expansion, options, decl.depth);
                    (
                        decl.span.hi as usize,
                        format!("\n\n{}", rendered.trim_end_matches('\n')),
                    )
                }
                Placement::Member => {
                    let rendered = render_indented(&expansion, options, decl.depth + 1);
                    member_insertion(source, decl, &rendered, options)
                }
            };
            edits.push(Edit {
                start: at,
                end: at,
                insert,
                seq: edits.len(),
            });
            expansions.push(AppliedExpansion {
                attribute: attachment.site.attribute.clone(),
                declaration: decl.decl.name.clone(),
                placement: expansion.placement,
            });
        }
    }

    // Back to front so earlier offsets stay valid.
    edits.sort_by(|a, b| b.start.cmp(&a.start).then(b.seq.cmp(&a.seq)));
    let mut text = source.to_string();
    for edit in edits {
        text.replace_range(edit.start..edit.end, &edit.insert);
    }

    if !expansions.is_empty() {
        info!(count = expansions.len(), "expanded source");
    }
    Ok(ExpandedSource { text, expansions })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_alone_on_its_line_takes_the_line() {
        let source = "    @Witness\n    protocol P {}";
        assert_eq!(attribute_removal(source, 4, 12), (0, 13));
    }

    #[test]
    fn inline_attribute_takes_following_spaces() {
        let source = "@Witness  protocol P {}";
        assert_eq!(attribute_removal(source, 0, 8), (0, 10));
    }
}
