use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};

/// Record returned by `GET schoolsinschoolyears`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSchool {
    pub id: i64,
    pub school: i64,
    pub year: i32,
    #[serde(default)]
    pub project_name: String,
    #[serde(default)]
    pub school_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct School {
    pub school_in_school_year_id: i64,
    pub school_id: i64,
    pub school_year: i32,
    pub project_name: String,
    pub school_name: String,
}

impl From<RawSchool> for School {
    fn from(raw: RawSchool) -> Self {
        School {
            school_in_school_year_id: raw.id,
            school_id: raw.school,
            school_year: raw.year,
            project_name: raw.project_name,
            school_name: raw.school_name,
        }
    }
}

/// The school year a date belongs to. Years roll over in August.
pub fn school_year_for(date: NaiveDate) -> i32 {
    if date.month() >= 8 {
        date.year()
    } else {
        date.year() - 1
    }
}

/// School year of today in server local time.
pub fn current_school_year() -> i32 {
    school_year_for(Local::now().date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn maps_upstream_names() {
        let raw: RawSchool = serde_json::from_value(json!({
            "id": 42,
            "school": 7,
            "year": 2024,
            "projectName": "2024-2025",
            "schoolName": "Testschool"
        }))
        .unwrap();

        let json = serde_json::to_value(School::from(raw)).unwrap();
        assert_eq!(
            json,
            json!({
                "schoolInSchoolYearId": 42,
                "schoolId": 7,
                "schoolYear": 2024,
                "projectName": "2024-2025",
                "schoolName": "Testschool"
            })
        );
    }

    #[test]
    fn school_year_rolls_over_in_august() {
        let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day).unwrap();
        assert_eq!(school_year_for(d(2025, 7, 31)), 2024);
        assert_eq!(school_year_for(d(2025, 8, 1)), 2025);
        assert_eq!(school_year_for(d(2026, 1, 15)), 2025);
    }
}
