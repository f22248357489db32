//! Localized string lookup.
//!
//! Property lists and some layouts carry numeric string ids ("clilocs")
//! plus tab-separated arguments. The string tables live outside this crate;
//! [`ClilocResolver`] is the seam they plug into.

use std::collections::HashMap;

/// Turns a cliloc id and its arguments into display text.
pub trait ClilocResolver: Send {
    /// `None` drops the entry from the property list.
    fn translate(&self, cliloc: u32, args: &str) -> Option<String>;
}

/// Fallback that renders `#<id>` followed by the arguments.
#[derive(Debug, Default, Clone, Copy)]
pub struct NumericClilocs;

impl ClilocResolver for NumericClilocs {
    fn translate(&self, cliloc: u32, args: &str) -> Option<String> {
        if args.is_empty() {
            Some(format!("#{cliloc}"))
        } else {
            Some(format!("#{cliloc}\t{args}"))
        }
    }
}

/// In-memory string table with `~N_NAME~` placeholders.
///
/// Arguments are tab-separated. An argument of the form `#<id>` is itself
/// looked up. Unknown ids fall back to [`NumericClilocs`].
#[derive(Debug, Default, Clone)]
pub struct ClilocTable {
    entries: HashMap<u32, String>,
}

impl ClilocTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, cliloc: u32, text: impl Into<String>) {
        self.entries.insert(cliloc, text.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, cliloc: u32) -> Option<&str> {
        self.entries.get(&cliloc).map(String::as_str)
    }

    fn argument(&self, raw: &str) -> String {
        match raw.strip_prefix('#').and_then(|id| id.parse::<u32>().ok()) {
            Some(id) => self
                .get(id)
                .map_or_else(|| raw.to_string(), str::to_string),
            None => raw.to_string(),
        }
    }
}

impl ClilocResolver for ClilocTable {
    fn translate(&self, cliloc: u32, args: &str) -> Option<String> {
        let Some(template) = self.get(cliloc) else {
            return NumericClilocs.translate(cliloc, args);
        };
        let args: Vec<&str> = if args.is_empty() {
            Vec::new()
        } else {
            args.split('\t').collect()
        };

        let mut out = String::with_capacity(template.len());
        let mut rest = template;
        while let Some(start) = rest.find('~') {
            out.push_str(&rest[..start]);
            let after = &rest[start + 1..];
            let Some(end) = after.find('~') else {
                out.push_str(&rest[start..]);
                rest = "";
                break;
            };
            let token = &after[..end];
            let index = token
                .split('_')
                .next()
                .and_then(|n| n.parse::<usize>().ok())
                .and_then(|n| n.checked_sub(1));
            if let Some(arg) = index.and_then(|i| args.get(i)) {
                out.push_str(&self.argument(arg));
            }
            rest = &after[end + 1..];
        }
        out.push_str(rest);
        Some(capitalize(out))
    }
}

fn capitalize(text: String) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) if first.is_lowercase() => first.to_uppercase().chain(chars).collect(),
        _ => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_fallback() {
        assert_eq!(NumericClilocs.translate(1050045, "").unwrap(), "#1050045");
        assert_eq!(
            NumericClilocs.translate(1050045, "a\tb").unwrap(),
            "#1050045\ta\tb"
        );
    }

    #[test]
    fn table_substitutes_placeholders() {
        let mut table = ClilocTable::new();
        table.insert(1060658, "~1_val~: ~2_val~");
        table.insert(1044, "iron");
        assert_eq!(
            table.translate(1060658, "durability\t20").unwrap(),
            "Durability: 20"
        );
        assert_eq!(table.translate(1060658, "#1044\tx").unwrap(), "Iron: x");
    }

    #[test]
    fn missing_argument_renders_empty() {
        let mut table = ClilocTable::new();
        table.insert(7, "a ~1_X~ b ~2_Y~");
        assert_eq!(table.translate(7, "one").unwrap(), "A one b ");
    }

    #[test]
    fn unknown_id_falls_back() {
        let table = ClilocTable::new();
        assert_eq!(table.translate(5, "").unwrap(), "#5");
    }
}
