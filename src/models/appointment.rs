use serde::{Deserialize, Serialize};

use super::subjects;

/// Kind of calendar item Zermelo distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AppointmentType {
    Lesson,
    Exam,
    OralExam,
    Activity,
    Talk,
    Mixed,
    Meeting,
    Interlude,
    #[serde(other)]
    Unknown,
}

impl AppointmentType {
    /// Every kind the kiosk displays, in query order.
    pub const DISPLAYED: [AppointmentType; 8] = [
        AppointmentType::Lesson,
        AppointmentType::Exam,
        AppointmentType::OralExam,
        AppointmentType::Activity,
        AppointmentType::Talk,
        AppointmentType::Mixed,
        AppointmentType::Meeting,
        AppointmentType::Interlude,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AppointmentType::Lesson => "lesson",
            AppointmentType::Exam => "exam",
            AppointmentType::OralExam => "oralExam",
            AppointmentType::Activity => "activity",
            AppointmentType::Talk => "talk",
            AppointmentType::Mixed => "mixed",
            AppointmentType::Meeting => "meeting",
            AppointmentType::Interlude => "interlude",
            AppointmentType::Unknown => "unknown",
        }
    }

    /// Comma separated list used as the `type` filter upstream.
    pub fn displayed_filter() -> String {
        Self::DISPLAYED
            .iter()
            .map(|t| t.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Appointment record as returned by `GET appointments`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAppointment {
    pub id: i64,
    pub appointment_instance: i64,
    pub start: i64,
    pub end: i64,
    #[serde(default)]
    pub start_time_slot_name: Option<String>,
    #[serde(default)]
    pub end_time_slot_name: Option<String>,
    #[serde(default)]
    pub locations: Vec<String>,
    #[serde(default)]
    pub subjects: Vec<String>,
    #[serde(default)]
    pub teachers: Vec<String>,
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(rename = "type", default = "unknown_type")]
    pub kind: AppointmentType,
    #[serde(default = "default_true")]
    pub valid: bool,
    #[serde(default)]
    pub cancelled: bool,
    #[serde(default)]
    pub teacher_changed: bool,
    #[serde(default)]
    pub group_changed: bool,
    #[serde(default)]
    pub location_changed: bool,
    #[serde(default)]
    pub time_changed: bool,
    #[serde(default)]
    pub change_description: Option<String>,
}

fn unknown_type() -> AppointmentType {
    AppointmentType::Unknown
}

fn default_true() -> bool {
    true
}

/// Fields requested from Zermelo when the caller does not narrow them.
pub const APPOINTMENT_FIELDS: &str = "id,appointmentInstance,start,end,startTimeSlotName,\
endTimeSlotName,locations,teachers,subjects,groups,type,valid,cancelled,teacherChanged,\
groupChanged,locationChanged,timeChanged,changeDescription";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentChanges {
    pub cancelled: bool,
    pub teacher_changed: bool,
    pub group_changed: bool,
    pub location_changed: bool,
    pub time_changed: bool,
    pub change_description: String,
}

/// One lesson, exam or activity as shown on the kiosk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: i64,
    pub appointment_instance: i64,
    pub start: i64,
    pub end: i64,
    pub locations: Vec<String>,
    pub subjects: Vec<String>,
    pub subjects_friendly_names: Vec<String>,
    pub teachers: Vec<String>,
    pub groups: Vec<String>,
    pub lesson_number_start: String,
    pub lesson_number_end: String,
    #[serde(rename = "type")]
    pub kind: AppointmentType,
    pub valid: bool,
    pub changes: AppointmentChanges,
}

impl From<RawAppointment> for Appointment {
    fn from(raw: RawAppointment) -> Self {
        Appointment {
            id: raw.id,
            appointment_instance: raw.appointment_instance,
            start: raw.start,
            end: raw.end,
            locations: raw.locations,
            subjects_friendly_names: subjects::friendly_names(&raw.subjects),
            subjects: raw.subjects,
            teachers: raw.teachers,
            groups: raw.groups,
            lesson_number_start: raw.start_time_slot_name.unwrap_or_default(),
            lesson_number_end: raw.end_time_slot_name.unwrap_or_default(),
            kind: raw.kind,
            valid: raw.valid,
            changes: AppointmentChanges {
                cancelled: raw.cancelled,
                teacher_changed: raw.teacher_changed,
                group_changed: raw.group_changed,
                location_changed: raw.location_changed,
                time_changed: raw.time_changed,
                change_description: raw.change_description.unwrap_or_default(),
            },
        }
    }
}

/// Map raw appointments and order them by start time. Equal starts keep
/// their upstream order.
pub fn build_schedule(raw: Vec<RawAppointment>) -> Vec<Appointment> {
    let mut schedule: Vec<Appointment> = raw.into_iter().map(Appointment::from).collect();
    schedule.sort_by_key(|a| a.start);
    schedule
}
