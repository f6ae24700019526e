//! Joining recorder sites to the site metadata table.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::Serialize;
use tracing::{debug, info};

use super::aliases::canonical_location;
use crate::constants::site_info_columns::{HABITAT, LATITUDE, LOCATION_SITE, LONGITUDE};
use crate::detections::FileDetectionRecord;
use crate::error::{Error, Result};

/// One row of the site metadata table, keyed for joining.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteMetadata {
    /// Normalised location and site number.
    pub key: String,
    /// Habitat label.
    pub habitat: String,
    /// Latitude, when the cell parses as a number.
    pub lat: Option<f64>,
    /// Longitude, when the cell parses as a number.
    pub lon: Option<f64>,
}

/// A recorder site with its habitat.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteInfo {
    /// Site identifier as it appears in the corpus.
    pub site: String,
    /// Habitat label from the metadata table.
    pub habitat: String,
    /// Latitude from the metadata table.
    pub lat: Option<f64>,
    /// Longitude from the metadata table.
    pub lon: Option<f64>,
}

/// Sites that matched a metadata row, plus the overall site count.
#[derive(Debug, Clone, Default)]
pub struct SiteJoin {
    sites: BTreeMap<String, SiteInfo>,
    total: usize,
}

impl SiteJoin {
    /// Matched sites keyed by corpus site id.
    pub fn sites(&self) -> &BTreeMap<String, SiteInfo> {
        &self.sites
    }

    /// Habitat of a corpus site, if it matched.
    pub fn habitat_of(&self, site: &str) -> Option<&str> {
        self.sites.get(site).map(|info| info.habitat.as_str())
    }

    /// Number of distinct corpus sites.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Number of corpus sites with habitat data.
    pub fn matched(&self) -> usize {
        self.sites.len()
    }

    /// Number of corpus sites without habitat data.
    pub fn unmatched(&self) -> usize {
        self.total - self.sites.len()
    }
}

/// Join key for a corpus site id such as `La-Palma_A-03`.
///
/// Location is every `_` part but the last, concatenated with `-` removed;
/// the site number is whatever follows the final `-`.
pub fn corpus_site_key(site: &str) -> String {
    let parts: Vec<&str> = site.split('_').collect();
    let location = parts[..parts.len() - 1].concat().replace('-', "").to_lowercase();
    let number = site.rsplit('-').next().unwrap_or_default().to_lowercase();
    format!("{location}{number}")
}

/// Join key for the location/site cell of a metadata row.
pub fn metadata_site_key(cell: &str) -> String {
    let normalised = cell.trim().to_lowercase().replace([' ', '-'], "");
    let location = normalised.split('_').next().unwrap_or_default();
    let number = normalised.rsplit('_').next().unwrap_or_default();
    format!("{}{number}", canonical_location(location))
}

/// Read the site metadata table.
///
/// The first row is a header. Column 1 holds location and site, column 2
/// the habitat, columns 8 and 9 latitude and longitude.
///
/// # Errors
///
/// Returns [`Error::SiteInfoRead`] if the file cannot be read or a row has
/// too few columns.
pub fn read_site_info(path: &Path) -> Result<Vec<SiteMetadata>> {
    let read_error = |source: Box<dyn std::error::Error + Send + Sync>| Error::SiteInfoRead {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(|e| read_error(Box::new(e)))?;

    let mut rows = Vec::new();
    for (line_num, result) in reader.records().enumerate() {
        let record = result.map_err(|e| read_error(Box::new(e)))?;
        if record.len() <= LONGITUDE {
            return Err(read_error(
                format!(
                    "line {}: expected at least {} columns, found {}",
                    line_num + 2,
                    LONGITUDE + 1,
                    record.len()
                )
                .into(),
            ));
        }

        rows.push(SiteMetadata {
            key: metadata_site_key(&record[LOCATION_SITE]),
            habitat: record[HABITAT].trim().to_string(),
            lat: record[LATITUDE].trim().parse().ok(),
            lon: record[LONGITUDE].trim().parse().ok(),
        });
    }

    debug!("Read {} site metadata rows from {}", rows.len(), path.display());
    Ok(rows)
}

/// Attach habitat data to corpus sites whose key matches a metadata row.
///
/// Corpus sites are taken in sorted order and a key belongs to the first
/// site that produces it; later sites with the same key stay unmatched.
/// When several rows share a key the last one wins.
pub fn join_sites(corpus: &[FileDetectionRecord], metadata: &[SiteMetadata]) -> SiteJoin {
    let site_ids: BTreeSet<&str> = corpus.iter().map(|f| f.site.as_str()).collect();

    let mut owner_of_key: BTreeMap<String, &str> = BTreeMap::new();
    for &site in &site_ids {
        owner_of_key.entry(corpus_site_key(site)).or_insert(site);
    }

    let mut sites: BTreeMap<String, SiteInfo> = BTreeMap::new();
    for row in metadata {
        if let Some(&site) = owner_of_key.get(&row.key) {
            sites.insert(
                site.to_string(),
                SiteInfo {
                    site: site.to_string(),
                    habitat: row.habitat.clone(),
                    lat: row.lat,
                    lon: row.lon,
                },
            );
        }
    }

    let join = SiteJoin {
        sites,
        total: site_ids.len(),
    };
    info!(
        "Total sites {}, {} with habitat data",
        join.total(),
        join.matched()
    );
    join
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn file_at(site: &str) -> FileDetectionRecord {
        FileDetectionRecord {
            site: site.to_string(),
            start: NaiveDate::from_ymd_opt(2019, 3, 1)
                .unwrap()
                .and_hms_opt(5, 0, 0)
                .unwrap(),
            lat: None,
            lon: None,
            duration_minutes: 1.0,
            detections: vec![],
        }
    }

    fn write_site_table(body: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "id,site,habitat,a,b,c,d,e,lat,lon").unwrap();
        write!(file, "{body}").unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_corpus_site_key() {
        assert_eq!(corpus_site_key("La-Palma_A-03"), "lapalma03");
        assert_eq!(corpus_site_key("Rio_Nuevo_X-1"), "rionuevo1");
        assert_eq!(corpus_site_key("Golfito-2"), "2");
    }

    #[test]
    fn test_metadata_site_key_applies_alias() {
        assert_eq!(metadata_site_key(" Palma_03 "), "lapalma03");
        assert_eq!(metadata_site_key("Rio-Nuevo_1"), "rionuevo1");
        assert_eq!(metadata_site_key("Sendero _ 7"), "golfito7");
    }

    #[test]
    fn test_read_and_join() {
        let table = write_site_table(
            "1,Palma_03,Forest,,,,,,8.61,-83.2\n\
             2,Sendero_7,Grassland,,,,,,8.65,n/a\n\
             3,Osa_9,Mangrove,,,,,,8.5,-83.5\n",
        );
        let metadata = read_site_info(table.path()).unwrap();
        assert_eq!(metadata.len(), 3);
        assert_eq!(metadata[1].lon, None);

        let corpus = vec![
            file_at("La-Palma_A-03"),
            file_at("La-Palma_A-03"),
            file_at("Golfito_B-7"),
            file_at("Unknown_C-1"),
        ];
        let join = join_sites(&corpus, &metadata);

        assert_eq!(join.total(), 3);
        assert_eq!(join.matched(), 2);
        assert_eq!(join.unmatched(), 1);
        assert_eq!(join.habitat_of("La-Palma_A-03"), Some("Forest"));
        assert_eq!(join.habitat_of("Golfito_B-7"), Some("Grassland"));
        assert_eq!(join.habitat_of("Unknown_C-1"), None);
        assert_eq!(join.sites()["La-Palma_A-03"].lat, Some(8.61));
    }

    #[test]
    fn test_short_row_is_rejected() {
        let table = write_site_table("1,Palma_03,Forest\n");
        let result = read_site_info(table.path());
        assert!(matches!(result, Err(Error::SiteInfoRead { .. })));
    }

    #[test]
    fn test_shared_key_goes_to_first_site_only() {
        // both ids normalise to "lapalma3"
        let corpus = vec![file_at("LaPalma_B-3"), file_at("La-Palma_A-3")];
        let table = write_site_table(
            "1,Palma_3,Forest,,,,,,8.61,-83.2\n\
             2,Palma_3,Pasture,,,,,,8.62,-83.1\n",
        );
        let metadata = read_site_info(table.path()).unwrap();

        let join = join_sites(&corpus, &metadata);
        assert_eq!(join.total(), 2);
        assert_eq!(join.matched(), 1);
        assert_eq!(join.habitat_of("La-Palma_A-3"), Some("Pasture"));
        assert_eq!(join.habitat_of("LaPalma_B-3"), None);
    }
}
