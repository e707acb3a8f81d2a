//! Record sink: the MXR measurement envelope.
//!
//! Prior consumers parse this structure bit-exactly, so the node names,
//! attributes and fixed text are not negotiable. The whole document is
//! rewritten after every appended run, the price of keeping the file valid
//! at all times; a failed run appends nothing.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::HostError;

const SRC_CONTENT: &str = "MV2 Host Software";
const DESCR_CONTENT: &str = "Results from MV2";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// An open MXR record file.
pub struct MxrFile {
    path: PathBuf,
    created: String,
    headings: String,
    measurements: Vec<String>,
}

impl MxrFile {
    /// Create (or truncate) the record file and write the empty envelope.
    pub fn create(path: &Path) -> Result<Self, HostError> {
        let record = Self {
            path: path.to_path_buf(),
            created: chrono::Local::now().format(TIMESTAMP_FORMAT).to_string(),
            headings: String::new(),
            measurements: Vec::new(),
        };
        record.save()?;
        Ok(record)
    }

    /// Append one successful run and rewrite the document.
    ///
    /// Headings are global to the dataset; the latest run's headings win,
    /// which is a no-op for a fixed script.
    pub fn append_run(&mut self, headings_csv: &str, results_csv: &str) -> Result<(), HostError> {
        self.headings = headings_csv.to_string();
        self.measurements.push(results_csv.to_string());
        self.save()
    }

    fn save(&self) -> Result<(), HostError> {
        fs::write(&self.path, self.render())?;
        Ok(())
    }

    fn render(&self) -> String {
        let mut doc = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        doc.push_str("<MetrolabXmlRecord ver=\"1.0\">\n");
        doc.push_str("  <header>\n");
        doc.push_str(&format!("    <src>{}</src>\n", escape(SRC_CONTENT)));
        doc.push_str(&format!(
            "    <datTim8601>{}</datTim8601>\n",
            escape(&self.created)
        ));
        doc.push_str(&format!("    <descr>{}</descr>\n", escape(DESCR_CONTENT)));
        doc.push_str("  </header>\n");
        doc.push_str("  <body type=\"tMXR_BODY_MV2\" ver=\"1.0\">\n");
        doc.push_str("    <dataset type=\"tMXR_DATASET_MV2_MEASUREMENT\" ver=\"1.0\">\n");
        doc.push_str(&format!(
            "      <headings>{}</headings>\n",
            escape(&self.headings)
        ));
        for measurement in &self.measurements {
            doc.push_str(&format!("      <meas>{}</meas>\n", escape(measurement)));
        }
        doc.push_str("    </dataset>\n");
        doc.push_str("  </body>\n");
        doc.push_str("</MetrolabXmlRecord>\n");
        doc
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_structure_survives_a_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.mxr");

        let mut record = MxrFile::create(&path).unwrap();
        record.append_run("Bx,By", "100,200\n101,201\n").unwrap();
        record.append_run("Bx,By", "102,202\n").unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let doc = roxmltree::Document::parse(&text).unwrap();
        let root = doc.root_element();
        assert_eq!("MetrolabXmlRecord", root.tag_name().name());
        assert_eq!(Some("1.0"), root.attribute("ver"));

        let dataset = root
            .descendants()
            .find(|n| n.has_tag_name("dataset"))
            .unwrap();
        assert_eq!(Some("tMXR_DATASET_MV2_MEASUREMENT"), dataset.attribute("type"));

        let headings = dataset
            .children()
            .find(|n| n.has_tag_name("headings"))
            .unwrap();
        assert_eq!(Some("Bx,By"), headings.text());

        let measurements: Vec<_> = dataset
            .children()
            .filter(|n| n.has_tag_name("meas"))
            .collect();
        assert_eq!(2, measurements.len());
        assert_eq!(Some("100,200\n101,201\n"), measurements[0].text());
    }

    #[test]
    fn reserved_characters_are_escaped() {
        assert_eq!("a&amp;b&lt;c&gt;d&quot;e", escape("a&b<c>d\"e"));
    }

    #[test]
    fn create_writes_an_empty_envelope() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.mxr");
        MxrFile::create(&path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let doc = roxmltree::Document::parse(&text).unwrap();
        assert!(doc
            .root_element()
            .descendants()
            .any(|n| n.has_tag_name("headings")));
        assert!(!doc.root_element().descendants().any(|n| n.has_tag_name("meas")));
    }
}
