//! Precomputed churn aggregates shown next to the form.
//!
//! The workbook is a spreadsheet with one named sheet per aggregate; a
//! directory with one CSV file per sheet is accepted as well. Each sheet has a
//! category column, a metric column and optionally a `Count` column. Nothing
//! here is computed; the tables are displayed as read.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Reader, Sheets};
use thiserror::Error;
use tracing::{debug, info};

pub const COUNT_COLUMN: &str = "Count";

#[derive(Debug, Error)]
pub enum InsightsError {
    #[error("cannot open {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot read {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("cannot read workbook {}: {source}", .path.display())]
    Spreadsheet {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },
    #[error("workbook {} has no sheet {sheet:?}", .path.display())]
    MissingSheet { path: PathBuf, sheet: String },
    #[error("{} has no column {column}", .path.display())]
    MissingColumn { path: PathBuf, column: String },
    #[error("{} row {row}: {value:?} is not a valid {column}", .path.display())]
    BadValue {
        path: PathBuf,
        row: usize,
        column: String,
        value: String,
    },
}

/// Where a sheet lives and which of its columns are charted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetLayout {
    pub name: &'static str,
    pub category: &'static str,
    pub metric: &'static str,
}

impl SheetLayout {
    pub fn file_name(&self) -> String {
        format!("{}.csv", self.name)
    }
}

pub const GEO_CHURN: SheetLayout = SheetLayout {
    name: "Geo Churn",
    category: "Geography",
    metric: "Churn Rate",
};
pub const AGE_CHURN: SheetLayout = SheetLayout {
    name: "Age Churn",
    category: "Age Group",
    metric: "Churn Rate",
};
pub const BALANCE_CHURN: SheetLayout = SheetLayout {
    name: "Balance vs Churn",
    category: "Churn Status",
    metric: "Balance",
};
pub const TENURE_CHURN: SheetLayout = SheetLayout {
    name: "Tenure Churn",
    category: "Tenure",
    metric: "Churn Rate",
};
pub const CREDIT_CHURN: SheetLayout = SheetLayout {
    name: "Credit vs Churn",
    category: "Churn Status",
    metric: "CreditScore",
};

pub const SHEETS: [SheetLayout; 5] = [GEO_CHURN, AGE_CHURN, BALANCE_CHURN, TENURE_CHURN, CREDIT_CHURN];

pub const FEATURE_IMPORTANCE: SheetLayout = SheetLayout {
    name: "Feature Importance",
    category: "Feature",
    metric: "Feature Importance Score",
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartStyle {
    HorizontalBar,
    Bar,
    Line,
}

/// The six charts the form can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartKind {
    FeatureImportance,
    Geography,
    AgeGroup,
    Balance,
    Tenure,
    CreditScore,
}

impl ChartKind {
    pub const ALL: [ChartKind; 6] = [
        ChartKind::FeatureImportance,
        ChartKind::Geography,
        ChartKind::AgeGroup,
        ChartKind::Balance,
        ChartKind::Tenure,
        ChartKind::CreditScore,
    ];

    /// Label of the toggle in the insights menu.
    pub fn menu_label(self) -> &'static str {
        match self {
            ChartKind::FeatureImportance => "Feature Importance",
            ChartKind::Geography => "Geography-wise Churn Rate",
            ChartKind::AgeGroup => "Age-wise Churn Rate",
            ChartKind::Balance => "Balance vs Churn",
            ChartKind::Tenure => "Tenure Impact on Churn",
            ChartKind::CreditScore => "Credit Score vs Churn",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            ChartKind::FeatureImportance => "Feature Importance",
            ChartKind::Geography => "Geography-wise Churn Rate",
            ChartKind::AgeGroup => "Age-wise Churn Rate",
            ChartKind::Balance => "Balance vs. Churn",
            ChartKind::Tenure => "Tenure Impact on Churn",
            ChartKind::CreditScore => "Credit Score vs. Churn",
        }
    }

    pub fn sheet(self) -> SheetLayout {
        match self {
            ChartKind::FeatureImportance => FEATURE_IMPORTANCE,
            ChartKind::Geography => GEO_CHURN,
            ChartKind::AgeGroup => AGE_CHURN,
            ChartKind::Balance => BALANCE_CHURN,
            ChartKind::Tenure => TENURE_CHURN,
            ChartKind::CreditScore => CREDIT_CHURN,
        }
    }

    pub fn style(self) -> ChartStyle {
        match self {
            ChartKind::FeatureImportance => ChartStyle::HorizontalBar,
            ChartKind::Tenure => ChartStyle::Line,
            _ => ChartStyle::Bar,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InsightRow {
    pub category: String,
    pub value: f64,
    pub count: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InsightTable {
    pub name: String,
    pub category_column: String,
    pub metric_column: String,
    pub rows: Vec<InsightRow>,
}

impl InsightTable {
    /// Rows ordered by metric value, smallest first.
    pub fn sorted_ascending(&self) -> InsightTable {
        let mut sorted = self.clone();
        sorted.rows.sort_by(|a, b| a.value.total_cmp(&b.value));
        sorted
    }

    /// Smallest and largest metric value, if there are rows.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.rows.iter().fold(None, |acc, row| match acc {
            None => Some((row.value, row.value)),
            Some((lo, hi)) => Some((lo.min(row.value), hi.max(row.value))),
        })
    }
}

/// Maps a header row plus data rows onto `layout`.
fn build_table(
    path: &Path,
    layout: SheetLayout,
    headers: &[String],
    records: Vec<Vec<String>>,
) -> Result<InsightTable, InsightsError> {
    let position = |column: &str| headers.iter().position(|h| h.trim() == column);
    let missing = |column: &str| InsightsError::MissingColumn {
        path: path.to_path_buf(),
        column: column.to_string(),
    };
    let category_idx = position(layout.category).ok_or_else(|| missing(layout.category))?;
    let metric_idx = position(layout.metric).ok_or_else(|| missing(layout.metric))?;
    let count_idx = position(COUNT_COLUMN);

    let mut rows = Vec::with_capacity(records.len());
    for (i, record) in records.iter().enumerate() {
        let row = i + 1;
        let field = |idx: usize| record.get(idx).map(|v| v.trim()).unwrap_or_default();
        let bad = |column: &str, value: &str| InsightsError::BadValue {
            path: path.to_path_buf(),
            row,
            column: column.to_string(),
            value: value.to_string(),
        };

        let raw_value = field(metric_idx);
        let value = raw_value
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| bad(layout.metric, raw_value))?;
        let count = match count_idx.map(field) {
            None | Some("") => None,
            Some(raw) => Some(raw.parse::<u64>().map_err(|_| bad(COUNT_COLUMN, raw))?),
        };
        rows.push(InsightRow {
            category: field(category_idx).to_string(),
            value,
            count,
        });
    }

    Ok(InsightTable {
        name: layout.name.to_string(),
        category_column: layout.category.to_string(),
        metric_column: layout.metric.to_string(),
        rows,
    })
}

/// Reads one sheet from a CSV file with a header row.
pub fn read_table(path: &Path, layout: SheetLayout) -> Result<InsightTable, InsightsError> {
    debug!("Reading insight sheet {:?} from {:?}", layout.name, path);
    let csv_error = |source| InsightsError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let file = std::fs::File::open(path).map_err(|source| InsightsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(file);

    let headers: Vec<String> = reader.headers().map_err(csv_error)?.iter().map(String::from).collect();
    let records = reader
        .records()
        .map(|record| record.map(|r| r.iter().map(String::from).collect()))
        .collect::<Result<Vec<Vec<String>>, _>>()
        .map_err(csv_error)?;
    build_table(path, layout, &headers, records)
}

/// Reads the two-column feature-importance file.
pub fn read_feature_importance(path: &Path) -> Result<InsightTable, InsightsError> {
    read_table(path, FEATURE_IMPORTANCE)
}

/// Reads one named sheet of an open spreadsheet. The first row is the header.
fn read_sheet(
    path: &Path,
    workbook: &mut Sheets<BufReader<File>>,
    layout: SheetLayout,
) -> Result<InsightTable, InsightsError> {
    debug!("Reading insight sheet {:?} from {:?}", layout.name, path);
    if !workbook.sheet_names().iter().any(|n| n == layout.name) {
        return Err(InsightsError::MissingSheet {
            path: path.to_path_buf(),
            sheet: layout.name.to_string(),
        });
    }
    let range = workbook
        .worksheet_range(layout.name)
        .map_err(|source| InsightsError::Spreadsheet {
            path: path.to_path_buf(),
            source,
        })?;

    let mut cells = range
        .rows()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect::<Vec<String>>());
    let headers = cells.next().ok_or_else(|| InsightsError::MissingColumn {
        path: path.to_path_buf(),
        column: layout.category.to_string(),
    })?;
    build_table(path, layout, &headers, cells.collect())
}

/// The five precomputed sheets, read-only once opened.
#[derive(Debug, Clone, PartialEq)]
pub struct InsightsWorkbook {
    tables: Vec<InsightTable>,
}

impl InsightsWorkbook {
    /// Reads every sheet in [`SHEETS`] from `path`.
    ///
    /// `path` is either a spreadsheet file (`.xlsx`, `.xls`, `.ods`) holding the
    /// five named sheets, or a directory with one `<sheet name>.csv` per sheet.
    pub fn open(path: &Path) -> Result<Self, InsightsError> {
        let tables = if path.is_dir() {
            SHEETS
                .iter()
                .map(|layout| read_table(&path.join(layout.file_name()), *layout))
                .collect::<Result<Vec<_>, _>>()?
        } else {
            let mut workbook = open_workbook_auto(path).map_err(|source| InsightsError::Spreadsheet {
                path: path.to_path_buf(),
                source,
            })?;
            SHEETS
                .iter()
                .map(|layout| read_sheet(path, &mut workbook, *layout))
                .collect::<Result<Vec<_>, _>>()?
        };
        info!("Loaded {} insight sheets from {:?}", tables.len(), path);
        Ok(Self { tables })
    }

    pub fn sheet(&self, name: &str) -> Option<&InsightTable> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn sheets(&self) -> &[InsightTable] {
        &self.tables
    }
}
