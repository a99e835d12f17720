//! Table persistence.
//!
//! Output is four-space indented JSON with every non-ASCII character written
//! as a `\uXXXX` escape, so the file is plain ASCII.

use crate::harvest::traits::WriteError;
use crate::model::ItemTable;
use serde::Serialize;
use serde_json::ser::{Formatter, PrettyFormatter};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

const INDENT: &[u8] = b"    ";

/// [`PrettyFormatter`] that escapes non-ASCII string content.
struct AsciiPrettyFormatter<'a> {
    inner: PrettyFormatter<'a>,
}

impl<'a> AsciiPrettyFormatter<'a> {
    fn with_indent(indent: &'a [u8]) -> Self {
        Self {
            inner: PrettyFormatter::with_indent(indent),
        }
    }
}

impl Formatter for AsciiPrettyFormatter<'_> {
    fn begin_array<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.begin_array(writer)
    }

    fn end_array<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_array(writer)
    }

    fn begin_array_value<W: ?Sized + Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        self.inner.begin_array_value(writer, first)
    }

    fn end_array_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_array_value(writer)
    }

    fn begin_object<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.begin_object(writer)
    }

    fn end_object<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_object(writer)
    }

    fn begin_object_key<W: ?Sized + Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        self.inner.begin_object_key(writer, first)
    }

    fn begin_object_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.begin_object_value(writer)
    }

    fn end_object_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_object_value(writer)
    }

    fn write_string_fragment<W: ?Sized + Write>(
        &mut self,
        writer: &mut W,
        fragment: &str,
    ) -> io::Result<()> {
        let mut start = 0;
        for (index, ch) in fragment.char_indices() {
            if ch.is_ascii() {
                continue;
            }
            writer.write_all(fragment[start..index].as_bytes())?;
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                write!(writer, "\\u{:04x}", unit)?;
            }
            start = index + ch.len_utf8();
        }
        writer.write_all(fragment[start..].as_bytes())
    }
}

/// Renders the table as four-space indented, ASCII-only JSON.
pub fn render_table(table: &ItemTable) -> Result<Vec<u8>, WriteError> {
    let mut buf = Vec::new();
    let formatter = AsciiPrettyFormatter::with_indent(INDENT);
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    table.serialize(&mut serializer)?;
    Ok(buf)
}

/// Creates or truncates `path` and writes the table into it.
///
/// The parent directory must already exist. Returns the number of bytes written.
pub fn write_table(table: &ItemTable, path: &Path) -> Result<usize, WriteError> {
    let rendered = render_table(table)?;
    let mut out = BufWriter::new(File::create(path)?);
    out.write_all(&rendered)?;
    out.flush()?;
    Ok(rendered.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ItemEntry;

    fn sample_table() -> ItemTable {
        let mut table = ItemTable::new();
        table.insert(
            "ENCHANTMENT_SHARPNESS_5".into(),
            ItemEntry::new("Enchantment Sharpness 5"),
        );
        table.insert("HYPERION".into(), ItemEntry::new("§dHyperion"));
        table
    }

    #[test]
    fn test_render_is_indented_sorted_and_ascii() {
        let rendered = String::from_utf8(render_table(&sample_table()).unwrap()).unwrap();
        let expected = "{\n    \"ENCHANTMENT_SHARPNESS_5\": {\n        \"name\": \"Enchantment Sharpness 5\"\n    },\n    \"HYPERION\": {\n        \"name\": \"\\u00a7dHyperion\"\n    }\n}";
        assert_eq!(rendered, expected);
        assert!(rendered.is_ascii());
    }

    #[test]
    fn test_render_escapes_astral_chars_as_surrogate_pairs() {
        let mut table = ItemTable::new();
        table.insert("TROPHY".into(), ItemEntry::new("Trophy 🏆 \"Gold\""));

        let rendered = String::from_utf8(render_table(&table).unwrap()).unwrap();

        assert!(rendered.contains(r#""Trophy \ud83c\udfc6 \"Gold\"""#));
        let parsed: ItemTable = serde_json::from_str(&rendered).unwrap();
        assert_eq!(parsed, table);
    }

    #[test]
    fn test_write_overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("items.json");
        std::fs::write(&path, "stale content that is longer than nothing").unwrap();

        let written = write_table(&ItemTable::new(), &path).unwrap();
        assert_eq!(written, 2);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}");
    }

    #[test]
    fn test_write_requires_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("items.json");
        assert!(matches!(
            write_table(&sample_table(), &path),
            Err(WriteError::Io(_))
        ));
    }
}
