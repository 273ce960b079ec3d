//! Escaped DQL fragment construction. Every caller-supplied value that ends up
//! inside query text is validated or quoted here before interpolation.

use crate::errors::DqlError;

const REGEX_META: &[char] = &[
    '\\', '/', '.', '*', '+', '?', '(', ')', '[', ']', '{', '}', '|', '^', '$',
];

/// Validates a predicate or type name.
pub fn ident(name: &str) -> Result<&str, DqlError> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | '~' | '@' | '-'));
    if valid {
        Ok(name)
    } else {
        Err(DqlError::invalid_input(format!("invalid identifier {name:?}")))
    }
}

/// Validates a node uid in either `0x`-hex or decimal form.
pub fn uid(value: &str) -> Result<&str, DqlError> {
    let valid = match value.strip_prefix("0x") {
        Some(hex) => !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit()),
        None => !value.is_empty() && value.chars().all(|c| c.is_ascii_digit()),
    };
    if valid {
        Ok(value)
    } else {
        Err(DqlError::invalid_input(format!("invalid uid {value:?}")))
    }
}

pub fn string_literal(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

/// Wraps `keyword` in regex delimiters so that it matches literally.
pub fn regex_literal(keyword: &str) -> String {
    let mut out = String::with_capacity(keyword.len() + 2);
    out.push('/');
    for c in keyword.chars() {
        if REGEX_META.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('/');
    out
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Filter {
    Func {
        name: &'static str,
        predicate: String,
        arg: String,
    },
    Uid(String),
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
}

impl Filter {
    pub(crate) fn func(
        name: &'static str,
        predicate: &str,
        arg: String,
    ) -> Result<Filter, DqlError> {
        Ok(Filter::Func {
            name,
            predicate: ident(predicate)?.to_string(),
            arg,
        })
    }

    pub fn eq_text(predicate: &str, value: &str) -> Result<Filter, DqlError> {
        Filter::func("eq", predicate, string_literal(value))
    }

    pub fn regexp(predicate: &str, keyword: &str) -> Result<Filter, DqlError> {
        Filter::func("regexp", predicate, regex_literal(keyword))
    }

    pub fn uid(value: &str) -> Result<Filter, DqlError> {
        Ok(Filter::Uid(uid(value)?.to_string()))
    }

    /// `uid(a, b, ..)` over one or more literal uids.
    pub fn uid_list<S: AsRef<str>>(values: &[S]) -> Result<Filter, DqlError> {
        if values.is_empty() {
            return Err(DqlError::invalid_input("uid list is empty"));
        }
        let uids = values
            .iter()
            .map(|value| uid(value.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Filter::Uid(uids.join(", ")))
    }

    /// References a query variable declared with `name as ...`.
    pub fn uid_var(name: &str) -> Result<Filter, DqlError> {
        Ok(Filter::Uid(ident(name)?.to_string()))
    }

    pub fn not(inner: Filter) -> Filter {
        Filter::Not(Box::new(inner))
    }

    /// Renders the expression; empty groups render to `None` and drop out of
    /// their parent.
    pub fn render(&self) -> Option<String> {
        match self {
            Filter::Func {
                name,
                predicate,
                arg,
            } => Some(format!("{name}({predicate}, {arg})")),
            Filter::Uid(value) => Some(format!("uid({value})")),
            Filter::And(parts) => join(parts, " and "),
            Filter::Or(parts) => join(parts, " or "),
            Filter::Not(inner) => inner.render().map(|text| format!("not {text}")),
        }
    }

    /// `@filter(...)`, or an empty string when nothing is left to filter on.
    pub fn directive(&self) -> String {
        match self.render() {
            Some(text) => format!("@filter({text})"),
            None => String::new(),
        }
    }
}

/// One root block: `name(func: root, args..) @filter(..) { body }`.
pub fn block(name: &str, root: &str, args: &[String], filter: &Filter, body: &str) -> String {
    let mut head = format!("{name}(func: {root}");
    for arg in args {
        head.push_str(", ");
        head.push_str(arg);
    }
    head.push(')');
    let directive = filter.directive();
    if !directive.is_empty() {
        head.push(' ');
        head.push_str(&directive);
    }
    format!("  {head} {{\n    {body}\n  }}")
}

pub fn type_root(type_name: &str) -> Result<String, DqlError> {
    Ok(format!("type({})", ident(type_name)?))
}

/// Wraps blocks into one query document.
pub fn document(blocks: &[String]) -> String {
    format!("{{\n{}\n}}", blocks.join("\n"))
}

fn join(parts: &[Filter], sep: &str) -> Option<String> {
    let rendered: Vec<String> = parts.iter().filter_map(Filter::render).collect();
    match rendered.len() {
        0 => None,
        1 => rendered.into_iter().next(),
        _ => Some(format!("({})", rendered.join(sep))),
    }
}
