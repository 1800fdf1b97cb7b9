use std::time::Duration;

use anyhow::{Context, Result, bail};
use regex::Regex;

const EUTILS_BASE_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";
const TOOL_NAME: &str = "busco-lineage";

/// Client for the NCBI Entrez taxonomy database
pub struct EntrezClient {
    base_url: String,
    email: String,
    client: reqwest::blocking::Client,
    lineage_regex: Regex,
}

impl EntrezClient {
    /// Create a client against the public eutils endpoint. The email identifies
    /// the caller to NCBI, as their usage policy requires.
    pub fn new(email: &str) -> Result<Self> {
        Self::with_base_url(EUTILS_BASE_URL, email)
    }

    /// Create a client against an explicit eutils base URL
    pub fn with_base_url(base_url: &str, email: &str) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(TOOL_NAME)
            .build()
            .context("Error building HTTP client")?;

        let lineage_regex = Regex::new("<Lineage>([^<]*)</Lineage>")
            .context("Error creating lineage regex")?;

        Ok(EntrezClient {
            base_url: base_url.to_string(),
            email: email.to_string(),
            client,
            lineage_regex,
        })
    }

    /// Fetch the lineage of a taxon from the taxonomy database, ordered from
    /// the broadest rank to the most specific one
    pub fn fetch_lineage(&self, taxon_id: u64) -> Result<Vec<String>> {
        let url = format!("{}/efetch.fcgi", self.base_url);
        let id = taxon_id.to_string();

        let response = self
            .client
            .get(&url)
            .query(&[
                ("db", "taxonomy"),
                ("id", id.as_str()),
                ("retmode", "xml"),
                ("tool", TOOL_NAME),
                ("email", self.email.as_str()),
            ])
            .send()
            .with_context(|| format!("Error fetching taxonomy record for taxon {taxon_id}"))?;

        if !response.status().is_success() {
            bail!("Entrez returned status {}", response.status());
        }

        let body = response.text().context("Error reading Entrez response body")?;

        self.parse_lineage(&body)
            .with_context(|| format!("No lineage in taxonomy record for taxon {taxon_id}"))
    }

    /// Extract the lineage out of an efetch taxonomy record. The first
    /// Lineage element belongs to the requested taxon; LineageEx repeats the
    /// same ranks as nested Taxon elements and never contains one.
    fn parse_lineage(&self, xml: &str) -> Result<Vec<String>> {
        let captures = self
            .lineage_regex
            .captures(xml)
            .context("Record contains no Lineage element")?;

        Ok(captures[1]
            .split("; ")
            .map(unescape)
            .filter(|rank| !rank.is_empty())
            .collect())
    }
}

/// Undo the XML entity escaping applied to element text
fn unescape(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXAMPLE_RECORD: &str = r#"<?xml version="1.0" ?>
<TaxaSet><Taxon>
    <TaxId>4932</TaxId>
    <ScientificName>Saccharomyces cerevisiae</ScientificName>
    <Rank>species</Rank>
    <Lineage>cellular organisms; Eukaryota; Opisthokonta; Fungi; Dikarya; Ascomycota; Saccharomycotina; Saccharomycetes; Saccharomycetales; Saccharomycetaceae; Saccharomyces</Lineage>
    <LineageEx>
        <Taxon>
            <TaxId>131567</TaxId>
            <ScientificName>cellular organisms</ScientificName>
            <Rank>no rank</Rank>
        </Taxon>
    </LineageEx>
</Taxon></TaxaSet>"#;

    fn get_client() -> EntrezClient {
        EntrezClient::new("test@example.com").unwrap()
    }

    #[test]
    fn test_parse_lineage() {
        let lineage = get_client().parse_lineage(EXAMPLE_RECORD).unwrap();

        assert_eq!(lineage.first().map(String::as_str), Some("cellular organisms"));
        assert_eq!(lineage.last().map(String::as_str), Some("Saccharomyces"));
        assert_eq!(lineage.len(), 11);
    }

    #[test]
    fn test_parse_lineage_unescapes_entities() {
        let record = "<Taxon><Lineage>cellular organisms; Bacteria; Bacteria &lt;incertae sedis&gt;; Candidatus &amp; friends</Lineage></Taxon>";
        let lineage = get_client().parse_lineage(record).unwrap();

        assert_eq!(
            lineage,
            vec![
                "cellular organisms".to_string(),
                "Bacteria".to_string(),
                "Bacteria <incertae sedis>".to_string(),
                "Candidatus & friends".to_string(),
            ]
        );
    }

    #[test]
    fn test_parse_lineage_empty_element() {
        let record = "<Taxon><Lineage></Lineage></Taxon>";
        let lineage = get_client().parse_lineage(record).unwrap();

        assert!(lineage.is_empty());
    }

    #[test]
    fn test_parse_lineage_missing_element() {
        let record = "<eFetchResult><ERROR>ID list is empty!</ERROR></eFetchResult>";

        assert!(get_client().parse_lineage(record).is_err());
    }
}
