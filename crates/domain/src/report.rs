//! Activity reports (RADOC): the evidence containers a dossier cites.

use serde::{Deserialize, Serialize};

use crate::scorable::Record;

/// One year's activity report for a faculty member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityReport {
    pub id: String,
    pub year: i32,
    #[serde(default)]
    pub records: Vec<Record>,
}

impl ActivityReport {
    pub fn new(id: impl Into<String>, year: i32, records: Vec<Record>) -> Self {
        ActivityReport {
            id: id.into(),
            year,
            records,
        }
    }

    /// Records whose report-kind tag equals `kind`.
    pub fn records_of_kind<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a Record> + 'a {
        self.records.iter().filter(move |r| r.kind() == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn filters_by_kind() {
        let report = ActivityReport::new(
            "radoc-2015",
            2015,
            vec![
                Record::new("aula", [("CHA", Value::from(64))]),
                Record::new("artigo", [("qualis", Value::from("A1"))]),
                Record::new("aula", [("CHA", Value::from(32))]),
            ],
        );
        assert_eq!(report.records_of_kind("aula").count(), 2);
        assert_eq!(report.records_of_kind("orientacao").count(), 0);
    }
}
