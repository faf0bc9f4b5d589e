// Dictionary text -> MDX source text (for MdxBuilder).

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::errors::{DictError, Result};
use super::util::*;


const BLOCK_LINES: usize = 100;


/// Records of one `key<TAB>definition` line. Synonyms in the key link to the first one.
pub fn to_mdx_records(line: &str) -> Option<String> {
    let mut fields = line.split('\t');
    let (key, definition) = match (fields.next(), fields.next(), fields.next()) {
        (Some(key), Some(definition), None) if !key.is_empty() && !definition.is_empty() => (key, definition),
        _ => return None,
    };

    let mut synonyms = key.split('|');
    let first = synonyms.next().unwrap_or(key);

    let mut records = String::new();
    for synonym in synonyms {
        records.push_str(&format!("{}\n@@@LINK={}\n</>\n", synonym, first));
    }
    records.push_str(&format!("{}\n{}\n</>\n", first, definition.replace("\\n", "")));
    Some(records)
}

fn sibling(path: &Path, stem: &str, suffix: &str) -> PathBuf {
    path.with_file_name(format!("{}{}", stem, suffix))
}

/// Converts `<stem>.txt` into `<stem>_mdx.txt`, title and description lines go to
/// `<stem>_title.html` and `<stem>_description.html`. `limit` caps the 100 line blocks read.
pub fn convert_file(path: &Path, limit: Option<usize>) -> Result<PathBuf> {
    let is_txt = path.extension().map_or(false, |e| e == "txt");
    if !is_txt {
        return Err(DictError::Config(format!("{} must be a .txt file", path.display())));
    }
    let stem = path.file_stem().map_or(String::new(), |s| s.to_string_lossy().into_owned());

    let buf = read_file_vec(path)?;
    let text = String::from_utf8_lossy(&buf);
    let lines: Vec<&str> = text.lines().collect();

    let output = sibling(path, &stem, "_mdx.txt");
    let mut writer = BufWriter::new(File::create(&output)?);
    let mut records = 0;

    for (i, block) in lines.chunks(BLOCK_LINES).take(limit.unwrap_or(usize::MAX)).enumerate() {
        for line in block {
            if i == 0 && line.starts_with("##") {
                write_metadata(path, &stem, line)?;
                continue;
            }
            if let Some(r) = to_mdx_records(line) {
                writer.write_all(r.as_bytes())?;
                records += 1;
            }
        }
    }
    writer.flush()?;

    log::info!("{} prepared for mdx, {} entries", output.display(), records);
    Ok(output)
}

fn write_metadata(path: &Path, stem: &str, line: &str) -> Result<()> {
    let mut fields = line.splitn(2, '\t');
    let (name, value) = (fields.next().unwrap_or(""), fields.next().unwrap_or(""));
    let target = match name {
        "##title" | "##name" => sibling(path, stem, "_title.html"),
        "##description" => sibling(path, stem, "_description.html"),
        _ => return Ok(()),
    };
    std::fs::write(target, format!("{}\n", value))?;
    Ok(())
}
