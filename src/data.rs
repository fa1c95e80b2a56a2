use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use polars::prelude::*;
use tracing::{debug, info};

use crate::domain::HrError;
use crate::list::{CellValue, Field};

pub const PRIORITY_RANKS: &[(&str, u32)] = &[("Low", 0), ("Medium", 1), ("High", 2)];
pub const PLAN_RANKS: &[(&str, u32)] = &[("Basic", 0), ("Standard", 1), ("Premium", 2)];

/// A table-displayable record type: an explicit field-accessor table for the
/// list controller plus a CSV column mapping for file loading.
pub trait Record: Sized + Sync {
    fn fields() -> Vec<Field<Self>>;
    fn csv_columns() -> &'static [&'static str];
    /// Builds a record from one CSV row, cells aligned with `csv_columns()`.
    /// Malformed numerics degrade to defaults, never fail.
    fn from_strings(cells: &[String]) -> Self;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ticket {
    pub id: i64,
    pub subject: String,
    pub priority: String,
    pub status: String,
    pub opened_by: String,
    pub created: String,
}

impl Record for Ticket {
    fn fields() -> Vec<Field<Self>> {
        vec![
            Field {
                key: "id",
                label: "ID",
                get: |t: &Ticket| CellValue::Int(t.id),
                rank: None,
            },
            Field {
                key: "subject",
                label: "Subject",
                get: |t: &Ticket| CellValue::Text(t.subject.clone()),
                rank: None,
            },
            Field {
                key: "priority",
                label: "Priority",
                get: |t: &Ticket| CellValue::Text(t.priority.clone()),
                rank: Some(PRIORITY_RANKS),
            },
            Field {
                key: "status",
                label: "Status",
                get: |t: &Ticket| CellValue::Text(t.status.clone()),
                rank: None,
            },
            Field {
                key: "opened_by",
                label: "Opened by",
                get: |t: &Ticket| CellValue::Text(t.opened_by.clone()),
                rank: None,
            },
            Field {
                key: "created",
                label: "Created",
                get: |t: &Ticket| CellValue::Text(t.created.clone()),
                rank: None,
            },
        ]
    }

    fn csv_columns() -> &'static [&'static str] {
        &["id", "subject", "priority", "status", "opened_by", "created"]
    }

    fn from_strings(cells: &[String]) -> Self {
        Ticket {
            id: cells[0].trim().parse().unwrap_or(0),
            subject: cells[1].clone(),
            priority: cells[2].clone(),
            status: cells[3].clone(),
            opened_by: cells[4].clone(),
            created: cells[5].clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Employee {
    pub id: i64,
    pub name: String,
    pub designation: String,
    pub department: String,
    pub salary: Option<f64>,
    pub joined: String,
}

impl Record for Employee {
    fn fields() -> Vec<Field<Self>> {
        vec![
            Field {
                key: "id",
                label: "ID",
                get: |e: &Employee| CellValue::Int(e.id),
                rank: None,
            },
            Field {
                key: "name",
                label: "Name",
                get: |e: &Employee| CellValue::Text(e.name.clone()),
                rank: None,
            },
            Field {
                key: "designation",
                label: "Designation",
                get: |e: &Employee| CellValue::Text(e.designation.clone()),
                rank: None,
            },
            Field {
                key: "department",
                label: "Department",
                get: |e: &Employee| CellValue::Text(e.department.clone()),
                rank: None,
            },
            Field {
                key: "salary",
                label: "Salary",
                get: |e: &Employee| match e.salary {
                    Some(v) => CellValue::Float(v),
                    None => CellValue::Missing,
                },
                rank: None,
            },
            Field {
                key: "joined",
                label: "Joined",
                get: |e: &Employee| CellValue::Text(e.joined.clone()),
                rank: None,
            },
        ]
    }

    fn csv_columns() -> &'static [&'static str] {
        &["id", "name", "designation", "department", "salary", "joined"]
    }

    fn from_strings(cells: &[String]) -> Self {
        Employee {
            id: cells[0].trim().parse().unwrap_or(0),
            name: cells[1].clone(),
            designation: cells[2].clone(),
            department: cells[3].clone(),
            salary: cells[4].trim().parse().ok(),
            joined: cells[5].clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Company {
    pub id: i64,
    pub name: String,
    pub owner: String,
    pub plan: String,
    pub headcount: i64,
}

impl Record for Company {
    fn fields() -> Vec<Field<Self>> {
        vec![
            Field {
                key: "id",
                label: "ID",
                get: |c: &Company| CellValue::Int(c.id),
                rank: None,
            },
            Field {
                key: "name",
                label: "Name",
                get: |c: &Company| CellValue::Text(c.name.clone()),
                rank: None,
            },
            Field {
                key: "owner",
                label: "Owner",
                get: |c: &Company| CellValue::Text(c.owner.clone()),
                rank: None,
            },
            Field {
                key: "plan",
                label: "Plan",
                get: |c: &Company| CellValue::Text(c.plan.clone()),
                rank: Some(PLAN_RANKS),
            },
            Field {
                key: "headcount",
                label: "Headcount",
                get: |c: &Company| CellValue::Int(c.headcount),
                rank: None,
            },
        ]
    }

    fn csv_columns() -> &'static [&'static str] {
        &["id", "name", "owner", "plan", "headcount"]
    }

    fn from_strings(cells: &[String]) -> Self {
        Company {
            id: cells[0].trim().parse().unwrap_or(0),
            name: cells[1].clone(),
            owner: cells[2].clone(),
            plan: cells[3].clone(),
            headcount: cells[4].trim().parse().unwrap_or(0),
        }
    }
}

/// Synchronous-core / fetching-shell boundary: the list controller never
/// sees a source, only the rows one fetch produced.
pub trait RowSource<T> {
    fn fetch(&self) -> Result<Vec<T>, HrError>;
}

/// Built-in demo datasets.
pub struct MockSource;

impl RowSource<Ticket> for MockSource {
    fn fetch(&self) -> Result<Vec<Ticket>, HrError> {
        Ok(vec![
            ticket(4001, "Payslip missing for July", "High", "Open", "a.kumar", "2026-08-02"),
            ticket(4002, "Update bank account", "Low", "Closed", "m.diaz", "2026-07-21"),
            ticket(4003, "VPN access for new hire", "Medium", "Open", "s.okafor", "2026-08-05"),
            ticket(4004, "Laptop keyboard broken", "Medium", "In Progress", "j.lee", "2026-08-07"),
            ticket(4005, "Overtime not reflected", "High", "Open", "p.novak", "2026-08-11"),
            ticket(4006, "Office chair request", "Low", "Open", "a.kumar", "2026-08-12"),
            ticket(4007, "Tax declaration form", "Medium", "Closed", "r.silva", "2026-07-30"),
        ])
    }
}

impl RowSource<Employee> for MockSource {
    fn fetch(&self) -> Result<Vec<Employee>, HrError> {
        Ok(vec![
            employee(101, "Amara Okafor", "Payroll Analyst", "Finance", Some(54000.0), "2022-03-14"),
            employee(102, "Jin Lee", "HR Manager", "Human Resources", Some(61000.0), "2020-11-02"),
            employee(103, "Marta Diaz", "Accountant", "Finance", Some(48500.0), "2023-06-19"),
            employee(104, "Petr Novak", "Support Engineer", "IT", Some(52000.0), "2021-09-27"),
            employee(105, "Rafael Silva", "Recruiter", "Human Resources", None, "2024-01-08"),
            employee(106, "Arjun Kumar", "Backend Developer", "IT", Some(67000.0), "2019-05-23"),
        ])
    }
}

impl RowSource<Company> for MockSource {
    fn fetch(&self) -> Result<Vec<Company>, HrError> {
        Ok(vec![
            company(11, "Brightpath Labs", "D. Weiss", "Premium", 140),
            company(12, "Cobalt Logistics", "F. Moreau", "Basic", 35),
            company(13, "Helix Foods", "T. Yamada", "Standard", 82),
            company(14, "Northwind Media", "K. Ostrovsky", "Standard", 57),
        ])
    }
}

fn ticket(
    id: i64,
    subject: &str,
    priority: &str,
    status: &str,
    opened_by: &str,
    created: &str,
) -> Ticket {
    Ticket {
        id,
        subject: subject.to_string(),
        priority: priority.to_string(),
        status: status.to_string(),
        opened_by: opened_by.to_string(),
        created: created.to_string(),
    }
}

fn employee(
    id: i64,
    name: &str,
    designation: &str,
    department: &str,
    salary: Option<f64>,
    joined: &str,
) -> Employee {
    Employee {
        id,
        name: name.to_string(),
        designation: designation.to_string(),
        department: department.to_string(),
        salary,
        joined: joined.to_string(),
    }
}

fn company(id: i64, name: &str, owner: &str, plan: &str, headcount: i64) -> Company {
    Company {
        id,
        name: name.to_string(),
        owner: owner.to_string(),
        plan: plan.to_string(),
        headcount,
    }
}

/// Loads records from a CSV file on disk.
pub struct CsvSource {
    path: PathBuf,
}

impl CsvSource {
    pub fn new(path: PathBuf) -> Result<Self, HrError> {
        let metadata = fs::metadata(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => HrError::FileNotFound,
            ErrorKind::PermissionDenied => HrError::PermissionDenied,
            _ => HrError::IoError(e),
        })?;
        if !metadata.is_file() {
            return Err(HrError::LoadingFailed("Not a file!".into()));
        }
        Ok(CsvSource { path })
    }

    fn load_frame(path: &Path) -> Result<DataFrame, HrError> {
        let frame = LazyCsvReader::new(PlPath::Local(path.into()))
            .with_has_header(true)
            .finish()?;
        Ok(frame.collect()?)
    }

    // All cells come out as strings; typed parsing happens in from_strings.
    fn column_strings(df: &DataFrame, name: &str) -> Result<Vec<String>, HrError> {
        let col = df
            .column(name)
            .map_err(|_| HrError::MissingColumn(name.to_string()))?
            .cast(&DataType::String)?;
        let series = col.str()?;
        Ok(series
            .into_iter()
            .map(|value| value.unwrap_or_default().to_string())
            .collect())
    }
}

impl<T: Record> RowSource<T> for CsvSource {
    fn fetch(&self) -> Result<Vec<T>, HrError> {
        let df = Self::load_frame(&self.path)?;
        let columns: Vec<Vec<String>> = T::csv_columns()
            .iter()
            .map(|name| Self::column_strings(&df, name))
            .collect::<Result<_, _>>()?;
        let nrows = columns.first().map(|c| c.len()).unwrap_or(0);

        let rows = (0..nrows)
            .map(|r| {
                let cells: Vec<String> = columns.iter().map(|c| c[r].clone()).collect();
                T::from_strings(&cells)
            })
            .collect::<Vec<T>>();

        info!("Loaded {} rows from {:?}", rows.len(), self.path);
        debug!("Columns: {:?}", T::csv_columns());
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::list::{ListState, SortDirection};

    fn fixture(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests/fixtures")
            .join(name)
    }

    #[test]
    fn mock_sources_provide_rows() {
        let tickets: Vec<Ticket> = MockSource.fetch().unwrap();
        let employees: Vec<Employee> = MockSource.fetch().unwrap();
        let companies: Vec<Company> = MockSource.fetch().unwrap();
        assert!(!tickets.is_empty());
        assert!(!employees.is_empty());
        assert!(!companies.is_empty());
    }

    #[test]
    fn tickets_sort_by_priority_rank() {
        let rows: Vec<Ticket> = MockSource.fetch().unwrap();
        let mut list = ListState::new(rows, Ticket::fields(), 25);
        list.sort_by(2, SortDirection::Ascending);
        let priorities: Vec<String> =
            list.visible_rows().iter().map(|t| t.priority.clone()).collect();
        let mut ranked: Vec<String> = priorities.clone();
        ranked.sort_by_key(|p| {
            PRIORITY_RANKS
                .iter()
                .find(|(label, _)| label.eq_ignore_ascii_case(p))
                .map(|(_, r)| *r)
                .unwrap_or(99)
        });
        assert_eq!(priorities, ranked);
    }

    #[test]
    fn malformed_numerics_degrade_to_defaults() {
        let cells: Vec<String> = ["abc", "Nia Bell", "Clerk", "Finance", "not-a-number", "2025-02-01"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let e = Employee::from_strings(&cells);
        assert_eq!(e.id, 0);
        assert_eq!(e.salary, None);
    }

    #[test]
    fn csv_source_loads_tickets() {
        let source = CsvSource::new(fixture("tickets.csv")).unwrap();
        let rows: Vec<Ticket> = source.fetch().unwrap();
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0].id, 1);
        assert_eq!(rows[0].priority, "High");
        assert!(rows.iter().all(|t| !t.subject.is_empty()));
    }

    #[test]
    fn csv_source_rejects_missing_files() {
        assert!(matches!(
            CsvSource::new(fixture("nope.csv")),
            Err(HrError::FileNotFound)
        ));
    }

    #[test]
    fn csv_source_reports_missing_columns() {
        let source = CsvSource::new(fixture("tickets.csv")).unwrap();
        let result: Result<Vec<Employee>, _> = source.fetch();
        assert!(matches!(result, Err(HrError::MissingColumn(_))));
    }
}
