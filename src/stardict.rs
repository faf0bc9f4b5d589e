// StarDict conversion with pyglossary and packaging of the results.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::config::Config;
use super::errors::{DictError, Result};
use super::util::*;
use super::writer::*;


const CONVERTER: &str = "pyglossary";
const EBOOK_CONVERTER: &str = "ebook-convert";

const PACKAGE_EXTENSIONS: &[&str] = &["ifo", "idx", "dict", "dict.dz", "syn"];

const STYLES_CSS: &str = "\
/* Light theme */
.thai { font-weight: bold; color: #000080; }
.pron { color: #008000; font-style: italic; }
.def { }
.syn { font-style: italic; color: #800080; }
.description { }
.science { font-size: smaller; }
.note { color: #808080; font-size: smaller; }
.level { font-size: smaller; }
.english { font-weight: bold; color: #800000; }
.type { font-style: italic; color: #000080; }
.clf { font-style: italic; }

/* Dark theme */
@media (prefers-color-scheme: dark) {
    body { background-color: #121212; color: #ffffff; }
    .thai { color: #87ceeb; }
    .pron { color: #90ee90; }
    .syn { color: #dda0dd; }
    .science { font-size: smaller; }
    .note { color: #d3d3d3; }
    .level { font-size: smaller; }
    .english { color: #ff6347; }
    .type { color: #87ceeb; }
}
";


/// Title written into the metadata of an output text.
fn title_for<'c>(config: &'c Config, file_name: &str) -> &'c str {
    match file_name {
        TH_PRON_EN_FILE => &config.titles.th_pron_en,
        TH_PRON_MERGE_EN_FILE => &config.titles.th_pron_merge_en,
        EN_TH_FILE => &config.titles.en_th,
        _ => &config.titles.th_en,
    }
}

fn deflated() -> SimpleFileOptions {
    SimpleFileOptions::default().compression_method(CompressionMethod::Deflated)
}

fn file_name_of(path: &Path) -> String {
    path.file_name().map_or(String::new(), |n| n.to_string_lossy().into_owned())
}


/// Turns the text outputs into zipped StarDict dictionaries.
#[derive(Debug)]
pub struct StardictBuilder {
    txt_dir: PathBuf,
    stardict_dir: PathBuf,
    unzipped_dir: PathBuf,
}

impl StardictBuilder {
    pub fn new(txt_dir: &Path, stardict_dir: &Path) -> StardictBuilder {
        StardictBuilder {
            txt_dir: txt_dir.to_path_buf(),
            stardict_dir: stardict_dir.to_path_buf(),
            unzipped_dir: stardict_dir.join("unzipped"),
        }
    }

    fn text_files(&self) -> Result<Vec<PathBuf>> {
        let files = MatchedFiles::sorted(&self.txt_dir, r"^volubilis_.*\.txt$")?;
        if files.is_empty() {
            return Err(DictError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no dictionary texts found in {}", self.txt_dir.display()))));
        }
        Ok(files)
    }

    /// Copies a text output into the staging directory with its title and description lines.
    pub fn stage_metadata(&self, txt_file: &Path, config: &Config) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.unzipped_dir)?;
        let name = file_name_of(txt_file);
        let staged = self.unzipped_dir.join(&name);

        let content = read_file_vec(txt_file)?;
        let mut writer = BufWriter::new(File::create(&staged)?);
        writeln!(writer, "##title\t{}", title_for(config, &name))?;
        writeln!(writer, "##description\t{}", config.description)?;
        writer.write_all(&content)?;
        writer.flush()?;

        Ok(staged)
    }

    /// Converts every `volubilis_*.txt` of the text directory, returns the `.ifo` files.
    pub fn convert_to_stardict(&self, config: &Config) -> Result<Vec<PathBuf>> {
        let mut ifo_files = Vec::new();
        for txt_file in self.text_files()? {
            let staged = self.stage_metadata(&txt_file, config)?;
            let ifo = staged.with_extension("ifo");
            log::info!("Converting {} to {}", txt_file.display(), ifo.display());

            let input = staged.to_string_lossy();
            let output = ifo.to_string_lossy();
            command_wait_output(CONVERTER, &["--no-sqlite", &input, &output])?;
            ifo_files.push(ifo);
        }
        Ok(ifo_files)
    }

    /// Zips every converted dictionary with its stylesheet. Returns the packages.
    pub fn create_zip_packages(&self) -> Result<Vec<PathBuf>> {
        let mut packages = Vec::new();
        for ifo in MatchedFiles::sorted(&self.unzipped_dir, r"\.ifo$")? {
            packages.push(self.create_single_zip(&ifo)?);
        }
        Ok(packages)
    }

    fn create_single_zip(&self, ifo: &Path) -> Result<PathBuf> {
        let stem = ifo.file_stem().map_or(String::new(), |s| s.to_string_lossy().into_owned());

        let res_zip = self.unzipped_dir.join(format!("{}.res.zip", stem));
        let mut res = ZipWriter::new(File::create(&res_zip)?);
        res.start_file("styles.css", deflated())?;
        res.write_all(STYLES_CSS.as_bytes())?;
        res.finish()?;

        let mut files: Vec<PathBuf> = PACKAGE_EXTENSIONS.iter()
            .map(|ext| self.unzipped_dir.join(format!("{}.{}", stem, ext)))
            .filter(|p| p.is_file())
            .collect();
        files.push(res_zip);

        std::fs::create_dir_all(&self.stardict_dir)?;
        let package = self.stardict_dir.join(format!("{}.zip", stem));
        log::info!("Creating zip package: {}", package.display());

        let mut zip = ZipWriter::new(File::create(&package)?);
        for file in &files {
            let name = file_name_of(file);
            zip.start_file(name.as_str(), deflated())?;
            zip.write_all(&read_file_vec(file)?)?;
            log::debug!("Added {} as {}", file.display(), name);
        }
        zip.finish()?;

        Ok(package)
    }

    /// Converts the text outputs to MOBI. Skipped with a warning when calibre is missing.
    pub fn convert_to_mobi(&self) -> Result<Vec<PathBuf>> {
        if !tool_available(EBOOK_CONVERTER) {
            log::warn!("Calibre not found - skipping MOBI conversion");
            return Ok(Vec::new());
        }

        let mut books = Vec::new();
        for txt_file in self.text_files()? {
            let mobi = self.stardict_dir.join(txt_file.with_extension("mobi").file_name().unwrap_or_default());
            let input = txt_file.to_string_lossy();
            let output = mobi.to_string_lossy();
            command_wait_output(EBOOK_CONVERTER, &[&input, &output])?;
            books.push(mobi);
        }
        Ok(books)
    }

    /// Conversion, packaging and the optional e-books.
    pub fn build(&self, config: &Config) -> Result<Vec<PathBuf>> {
        log::info!("Converting to Stardict format...");
        self.convert_to_stardict(config)?;

        log::info!("Creating zip packages...");
        let packages = self.create_zip_packages()?;

        if config.enable_mobi_build {
            log::info!("Converting to MOBI format...");
            self.convert_to_mobi()?;
        }

        log::info!("Created {} Stardict packages:", packages.len());
        for package in &packages {
            log::info!("  - {}", package.display());
        }
        Ok(packages)
    }
}
