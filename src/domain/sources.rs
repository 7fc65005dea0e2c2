//! Built-in source tables for the three upstream providers.

use crate::domain::model::SourceTable;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceGroup {
    /// Santé Montréal
    Montreal,
    /// Institut national de santé publique du Québec
    Inspq,
    /// Québec.ca/coronavirus
    Quebec,
}

impl SourceGroup {
    pub const ALL: [SourceGroup; 3] = [SourceGroup::Montreal, SourceGroup::Inspq, SourceGroup::Quebec];

    pub fn name(&self) -> &'static str {
        match self {
            SourceGroup::Montreal => "mtl",
            SourceGroup::Inspq => "inspq",
            SourceGroup::Quebec => "qc",
        }
    }

    pub fn table(&self) -> SourceTable {
        match self {
            SourceGroup::Montreal => montreal_sources(),
            SourceGroup::Inspq => inspq_sources(),
            SourceGroup::Quebec => quebec_sources(),
        }
    }
}

impl fmt::Display for SourceGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub fn builtin_tables() -> Vec<SourceTable> {
    SourceGroup::ALL.iter().map(SourceGroup::table).collect()
}

const MTL_CSV_BASE: &str =
    "https://santemontreal.qc.ca/fileadmin/fichiers/Campagnes/coronavirus/situation-montreal";

// CSV files are ';' separated and served as Windows-1252.
fn montreal_sources() -> SourceTable {
    SourceTable::new(SourceGroup::Montreal.name())
        .with_entry(
            "data_mtl.html",
            "https://santemontreal.qc.ca/en/public/coronavirus-covid-19/situation-of-the-coronavirus-covid-19-in-montreal",
        )
        .with_entry("data_mtl_ciuss.csv", format!("{}/ciusss.csv", MTL_CSV_BASE))
        .with_entry("data_mtl_municipal.csv", format!("{}/municipal.csv", MTL_CSV_BASE))
        .with_entry("data_mtl_age.csv", format!("{}/grage.csv", MTL_CSV_BASE))
        .with_entry("data_mtl_sex.csv", format!("{}/sexe.csv", MTL_CSV_BASE))
        .with_entry("data_mtl_new_cases.csv", format!("{}/courbe.csv", MTL_CSV_BASE))
}

const INSPQ_CSV_BASE: &str = "https://www.inspq.qc.ca/sites/default/files/covid/donnees";

// CSV files are ',' separated UTF-8.
fn inspq_sources() -> SourceTable {
    SourceTable::new(SourceGroup::Inspq.name())
        .with_entry("INSPQ_main.html", "https://www.inspq.qc.ca/covid-19/donnees")
        .with_entry("INSPQ_region.html", "https://www.inspq.qc.ca/covid-19/donnees/regions")
        .with_entry("INSPQ_par_region.html", "https://www.inspq.qc.ca/covid-19/donnees/par-region")
        .with_entry("data_qc.csv", format!("{}/covid19-hist.csv", INSPQ_CSV_BASE))
        .with_entry("data_qc_regions.csv", format!("{}/regions.csv", INSPQ_CSV_BASE))
        .with_entry("data_qc_manual_data.csv", format!("{}/manual-data.csv", INSPQ_CSV_BASE))
        .with_entry("data_qc_cases_by_network.csv", format!("{}/tableau-rls-new.csv", INSPQ_CSV_BASE))
        .with_entry("data_qc_death_loc_by_region.csv", format!("{}/tableau-rpa-new.csv", INSPQ_CSV_BASE))
        // Updated weekly, on Tuesdays.
        .with_entry("data_qc_preconditions.csv", format!("{}/comorbidite.csv", INSPQ_CSV_BASE))
}

const QC_SITUATION_PAGE: &str =
    "https://www.quebec.ca/en/health/health-issues/a-z/2019-coronavirus/situation-coronavirus-in-quebec";
const QC_CSV_BASE: &str =
    "https://cdn-contenu.quebec.ca/cdn-contenu/sante/documents/Problemes_de_sante/covid-19/csv";

fn quebec_sources() -> SourceTable {
    SourceTable::new(SourceGroup::Quebec.name())
        .with_entry("QC_situation.html", format!("{}/", QC_SITUATION_PAGE))
        .with_entry("QC_vaccination.html", format!("{}/covid-19-vaccination-data/", QC_SITUATION_PAGE))
        .with_entry("data_qc_outbreaks.csv", format!("{}/eclosions-par-milieu.csv", QC_CSV_BASE))
        .with_entry("data_qc_vaccines.csv", format!("{}/doses-vaccins.csv", QC_CSV_BASE))
        .with_entry("data_qc_vaccines_received.csv", format!("{}/doses-vaccins-7jours.csv", QC_CSV_BASE))
        .with_entry("data_qc_vaccines_situation.csv", format!("{}/situation-vaccination-en.csv", QC_CSV_BASE))
        .with_entry("data_qc_7days.csv", format!("{}/synthese-7jours.csv", QC_CSV_BASE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::validation::{validate_filename, validate_url};
    use std::collections::HashSet;

    #[test]
    fn test_builtin_tables_are_well_formed() {
        let tables = builtin_tables();
        let names: Vec<&str> = tables.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["mtl", "inspq", "qc"]);

        let mut filenames = HashSet::new();
        for table in &tables {
            assert!(!table.is_empty());
            for entry in &table.entries {
                validate_filename("filename", &entry.filename).unwrap();
                validate_url("url", &entry.url).unwrap();
                assert!(entry.url.starts_with("https://"));
                // All groups may share one dated directory.
                assert!(filenames.insert(entry.filename.clone()), "{}", entry.filename);
            }
        }
    }

    #[test]
    fn test_montreal_table_order() {
        let table = SourceGroup::Montreal.table();
        assert_eq!(table.len(), 6);
        assert_eq!(table.entries[0].filename, "data_mtl.html");
        assert_eq!(
            table.entries[1].url,
            "https://santemontreal.qc.ca/fileadmin/fichiers/Campagnes/coronavirus/situation-montreal/ciusss.csv"
        );
    }
}
