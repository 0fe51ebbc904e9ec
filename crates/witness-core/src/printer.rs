//! Renders the output model as Swift source. This is the only place that turns
//! generated declarations into text.

use std::fmt::{self, Formatter};

use crate::output::{
    Expansion, FunctionDecl, InitializerDecl, MemberDecl, PropertyBody, PropertyDecl, TypeDecl,
};
use crate::pretty::{pretty, PrettyCtx, PrettyOptions, PrettyPrintable};
use crate::signature::{effect_keywords, parameter_clause};

fn access_prefix(access: Option<crate::ast::Access>) -> String {
    access
        .map(|access| format!("{} ", access.keyword()))
        .unwrap_or_default()
}

fn static_prefix(is_static: bool) -> &'static str {
    if is_static {
        "static "
    } else {
        ""
    }
}

impl PrettyPrintable for TypeDecl {
    fn fmt_pretty(&self, f: &mut Formatter<'_>, ctx: &mut PrettyCtx<'_>) -> fmt::Result {
        for attribute in &self.attributes {
            ctx.writeln(f, attribute)?;
        }
        let mut header = format!(
            "{}{} {}",
            access_prefix(self.access),
            self.keyword.text(),
            self.name
        );
        if !self.conformances.is_empty() {
            header.push_str(": ");
            header.push_str(&self.conformances.join(", "));
        }
        if let Some(clause) = &self.where_clause {
            header.push_str(" where ");
            header.push_str(clause);
        }
        if self.sections.is_empty() {
            return ctx.writeln(f, format!("{header} {{}}"));
        }
        ctx.writeln(f, format!("{header} {{"))?;
        ctx.with_indent(|ctx| {
            for (index, section) in self.sections.iter().enumerate() {
                if index > 0 {
                    writeln!(f)?;
                }
                for member in section {
                    member.fmt_pretty(f, ctx)?;
                }
            }
            Ok(())
        })?;
        ctx.writeln(f, "}")
    }
}

impl PrettyPrintable for MemberDecl {
    fn fmt_pretty(&self, f: &mut Formatter<'_>, ctx: &mut PrettyCtx<'_>) -> fmt::Result {
        match self {
            MemberDecl::Property(prop) => prop.fmt_pretty(f, ctx),
            MemberDecl::Function(func) => func.fmt_pretty(f, ctx),
            MemberDecl::Initializer(init) => init.fmt_pretty(f, ctx),
        }
    }
}

impl PrettyPrintable for PropertyDecl {
    fn fmt_pretty(&self, f: &mut Formatter<'_>, ctx: &mut PrettyCtx<'_>) -> fmt::Result {
        let head = format!(
            "{}{}{} {}: {}",
            access_prefix(self.access),
            static_prefix(self.is_static),
            self.binding.keyword(),
            self.name,
            self.ty
        );
        match &self.body {
            PropertyBody::Stored => ctx.writeln(f, head),
            PropertyBody::Initialized(expr) => ctx.writeln(f, format!("{head} = {expr}")),
            PropertyBody::InitializedBlock(statements) => {
                ctx.writeln(f, format!("{head} = {{"))?;
                ctx.with_indent(|ctx| {
                    for statement in statements {
                        ctx.writeln(f, statement)?;
                    }
                    Ok(())
                })?;
                ctx.writeln(f, "}()")
            }
            PropertyBody::Getter(expr) => ctx.writeln(f, format!("{head} {{ {expr} }}")),
            PropertyBody::EffectfulGetter { effects, expr } => {
                let accessor = match effect_keywords(*effects) {
                    Some(keywords) => format!("get {keywords}"),
                    None => "get".to_string(),
                };
                ctx.writeln(f, format!("{head} {{"))?;
                ctx.with_indent(|ctx| ctx.writeln(f, format!("{accessor} {{ {expr} }}")))?;
                ctx.writeln(f, "}")
            }
        }
    }
}

fn write_body(
    f: &mut Formatter<'_>,
    ctx: &mut PrettyCtx<'_>,
    header: String,
    body: &[String],
) -> fmt::Result {
    if body.is_empty() {
        return ctx.writeln(f, format!("{header} {{}}"));
    }
    ctx.writeln(f, format!("{header} {{"))?;
    ctx.with_indent(|ctx| {
        for line in body {
            ctx.writeln(f, line)?;
        }
        Ok(())
    })?;
    ctx.writeln(f, "}")
}

impl PrettyPrintable for FunctionDecl {
    fn fmt_pretty(&self, f: &mut Formatter<'_>, ctx: &mut PrettyCtx<'_>) -> fmt::Result {
        for attribute in &self.attributes {
            ctx.writeln(f, attribute)?;
        }
        let mut header = format!(
            "{}{}func {}({})",
            access_prefix(self.access),
            static_prefix(self.is_static),
            self.name,
            parameter_clause(&self.params)
        );
        if let Some(keywords) = effect_keywords(self.effects) {
            header.push(' ');
            header.push_str(keywords);
        }
        if let Some(ret) = &self.return_type {
            header.push_str(" -> ");
            header.push_str(ret);
        }
        write_body(f, ctx, header, &self.body)
    }
}

impl PrettyPrintable for InitializerDecl {
    fn fmt_pretty(&self, f: &mut Formatter<'_>, ctx: &mut PrettyCtx<'_>) -> fmt::Result {
        let header = format!(
            "{}init({})",
            access_prefix(self.access),
            parameter_clause(&self.params)
        );
        write_body(f, ctx, header, &self.body)
    }
}

impl PrettyPrintable for Expansion {
    fn fmt_pretty(&self, f: &mut Formatter<'_>, ctx: &mut PrettyCtx<'_>) -> fmt::Result {
        for (index, decl) in self.declarations.iter().enumerate() {
            if index > 0 {
                writeln!(f)?;
            }
            decl.fmt_pretty(f, ctx)?;
        }
        Ok(())
    }
}

/// Render with an explicit starting indentation, used when an expansion is
/// spliced into an enclosing body.
pub struct IndentedDisplay<'a, T> {
    value: &'a T,
    options: PrettyOptions,
    levels: usize,
}

impl<'a, T: PrettyPrintable> fmt::Display for IndentedDisplay<'a, T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut ctx = PrettyCtx::new(&self.options);
        for _ in 0..self.levels {
            ctx.increase_indent();
        }
        self.value.fmt_pretty(f, &mut ctx)
    }
}

pub fn render<T: PrettyPrintable>(value: &T, options: &PrettyOptions) -> String {
    pretty(value, options.clone()).to_string()
}

pub fn render_indented<T: PrettyPrintable>(
    value: &T,
    options: &PrettyOptions,
    levels: usize,
) -> String {
    IndentedDisplay {
        value,
        options: options.clone(),
        levels,
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Access, Effects, Parameter};
    use crate::output::TypeKeyword;
    use pretty_assertions::assert_eq;

    #[test]
    fn renders_effectful_getter_block() {
        let prop = PropertyDecl::new(
            "token",
            "String",
            PropertyBody::EffectfulGetter {
                effects: Effects::new(true, true),
                expr: "try await _token()".into(),
            },
        );
        let rendered = render(&MemberDecl::Property(prop), &PrettyOptions::default());
        assert_eq!(
            rendered,
            "var token: String {\n    get async throws { try await _token() }\n}\n"
        );
    }

    #[test]
    fn renders_type_with_sections() {
        let mut decl = TypeDecl::new(TypeKeyword::Struct, "ClockWitness");
        decl.access = Some(Access::Public);
        decl.conformances.push("Clock".into());
        decl.push_section(vec![MemberDecl::Function(FunctionDecl {
            attributes: vec![],
            access: Some(Access::Public),
            is_static: false,
            name: "sleep".into(),
            params: vec![Parameter::new("for", "Duration").with_name("duration")],
            effects: Effects::new(true, true),
            return_type: None,
            body: vec!["try await _sleep(duration)".into()],
        })]);
        decl.push_section(vec![MemberDecl::Initializer(InitializerDecl {
            access: None,
            params: vec![],
            body: vec![],
        })]);

        let rendered = render(&decl, &PrettyOptions { indent_size: 2 });
        assert_eq!(
            rendered,
            "public struct ClockWitness: Clock {\n  public func sleep(for duration: Duration) async throws {\n    try await _sleep(duration)\n  }\n\n  init() {}\n}\n"
        );
    }

    #[test]
    fn where_clause_follows_the_name() {
        let mut decl = TypeDecl::new(TypeKeyword::Extension, "Clock");
        decl.where_clause = Some("Self == ClockWitness".into());
        assert_eq!(
            render(&decl, &PrettyOptions::default()),
            "extension Clock where Self == ClockWitness {}
"
        );
    }
}
