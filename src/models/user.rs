use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, ErrorCode};

/// Zermelo codes are numeric for students and letters for teachers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserCode {
    Number(i64),
    Text(String),
}

/// Which Zermelo collection a user is looked up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserKind {
    Student,
    Teacher,
}

impl FromStr for UserKind {
    type Err = AppError;

    /// Case-insensitive `student` or `teacher`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "student" => Ok(UserKind::Student),
            "teacher" => Ok(UserKind::Teacher),
            _ => Err(AppError::new(ErrorCode::ParameterInvalid)
                .with_details("De parameter 'type' is ongeldig. Gebruik 'student' of 'teacher'")),
        }
    }
}

/// Record returned by `GET studentsindepartments`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawStudent {
    pub student: UserCode,
    pub first_name: String,
    #[serde(default)]
    pub prefix: Option<String>,
    pub last_name: String,
    #[serde(default)]
    pub main_group_name: Option<String>,
    #[serde(default)]
    pub main_group: Option<i64>,
    #[serde(default)]
    pub mentor_group: Option<i64>,
    #[serde(default)]
    pub department_of_branch: Option<i64>,
}

/// Record returned by `GET contracts`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTeacher {
    pub employee: UserCode,
    pub first_name: String,
    #[serde(default)]
    pub prefix: Option<String>,
    pub last_name: String,
}

/// Owner of the upstream API token, from `GET users/~me`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTokenUser {
    pub code: UserCode,
    #[serde(default)]
    pub employee_school_in_school_years: Vec<i64>,
}

pub const STUDENT_FIELDS: &str =
    "student,firstName,prefix,lastName,mainGroupName,mainGroup,mentorGroup,departmentOfBranch";
pub const TEACHER_FIELDS: &str = "employee,firstName,prefix,lastName";

/// Full student record, group and department included. The user endpoint
/// narrows it to [`ZermeloUser`], so the group fields are not served.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub code: UserCode,
    pub first_name: String,
    pub prefix: String,
    pub last_name: String,
    pub main_group_name: Option<String>,
    pub main_group: Option<i64>,
    pub mentor_group: Option<i64>,
    pub department_of_branch: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Teacher {
    pub code: UserCode,
    pub first_name: String,
    pub prefix: String,
    pub last_name: String,
}

/// The person shown on the kiosk after a badge scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZermeloUser {
    pub code: UserCode,
    pub first_name: String,
    pub prefix: String,
    pub last_name: String,
}

impl From<RawStudent> for Student {
    fn from(raw: RawStudent) -> Self {
        Student {
            code: raw.student,
            first_name: raw.first_name,
            prefix: raw.prefix.unwrap_or_default(),
            last_name: raw.last_name,
            main_group_name: raw.main_group_name,
            main_group: raw.main_group,
            mentor_group: raw.mentor_group,
            department_of_branch: raw.department_of_branch,
        }
    }
}

impl From<RawTeacher> for Teacher {
    fn from(raw: RawTeacher) -> Self {
        Teacher {
            code: raw.employee,
            first_name: raw.first_name,
            prefix: raw.prefix.unwrap_or_default(),
            last_name: raw.last_name,
        }
    }
}

impl From<Student> for ZermeloUser {
    fn from(student: Student) -> Self {
        ZermeloUser {
            code: student.code,
            first_name: student.first_name,
            prefix: student.prefix,
            last_name: student.last_name,
        }
    }
}

impl From<Teacher> for ZermeloUser {
    fn from(teacher: Teacher) -> Self {
        ZermeloUser {
            code: teacher.code,
            first_name: teacher.first_name,
            prefix: teacher.prefix,
            last_name: teacher.last_name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn student_maps_code_and_default_prefix() {
        let raw: RawStudent = serde_json::from_value(json!({
            "student": 545959,
            "firstName": "Jan",
            "prefix": null,
            "lastName": "Dool",
            "mainGroupName": "g6v2",
            "mainGroup": 12345
        }))
        .unwrap();

        let student = Student::from(raw);
        assert_eq!(student.code, UserCode::Number(545959));
        assert_eq!(student.prefix, "");
        assert_eq!(student.mentor_group, None);

        let user = ZermeloUser::from(student);
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(
            json,
            json!({"code": 545959, "firstName": "Jan", "prefix": "", "lastName": "Dool"})
        );
    }

    #[test]
    fn teacher_code_comes_from_employee() {
        let raw: RawTeacher = serde_json::from_value(json!({
            "employee": "GIJS",
            "firstName": "Gijs",
            "prefix": "van der",
            "lastName": "Berg"
        }))
        .unwrap();

        let user = ZermeloUser::from(Teacher::from(raw));
        assert_eq!(user.code, UserCode::Text("GIJS".to_string()));
        assert_eq!(user.prefix, "van der");
    }

    #[test]
    fn user_kind_parsing() {
        assert_eq!("Student".parse::<UserKind>().unwrap(), UserKind::Student);
        assert_eq!(" TEACHER ".parse::<UserKind>().unwrap(), UserKind::Teacher);
        let err = "parent".parse::<UserKind>().unwrap_err();
        assert_eq!(err.code(), ErrorCode::ParameterInvalid);
    }

    #[test]
    fn token_user_without_memberships() {
        let raw: RawTokenUser = serde_json::from_value(json!({"code": "api"})).unwrap();
        assert!(raw.employee_school_in_school_years.is_empty());
    }
}
