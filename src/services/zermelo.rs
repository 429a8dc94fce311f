use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::config::ZermeloConfig;
use crate::error::{AppError, AppResult, ErrorCode};
use crate::models::{
    AppointmentType, RawAppointment, RawSchool, RawStudent, RawTeacher, RawTokenUser,
    APPOINTMENT_FIELDS, STUDENT_FIELDS, TEACHER_FIELDS,
};

/// Widest schedule window a single query may span (62 days).
pub const MAX_WINDOW_SECS: i64 = 5_356_800;

const TOKEN_USER_FIELDS: &str = "code,employeeSchoolInSchoolYears";

// ============================================================================
// Transport
// ============================================================================

/// Status and body of one upstream HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawReply {
    pub status: u16,
    pub body: String,
}

/// Performs authenticated GETs against the Zermelo `api/v3` root.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, path: &str, query: &[(&'static str, String)]) -> AppResult<RawReply>;
}

#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: Url,
    api_token: String,
    debug: bool,
}

impl HttpTransport {
    pub fn new(config: &ZermeloConfig, debug: bool) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                tracing::error!("Failed to build HTTP client: {}", e);
                AppError::new(ErrorCode::Default)
            })?;

        let mut portal = config.portal_url.clone();
        if !portal.path().ends_with('/') {
            let path = format!("{}/", portal.path());
            portal.set_path(&path);
        }
        let base_url = portal.join("api/v3/").map_err(|e| {
            tracing::error!("Invalid Zermelo portal URL {}: {}", config.portal_url, e);
            AppError::new(ErrorCode::ConfigMissing)
        })?;

        Ok(Self {
            client,
            base_url,
            api_token: config.api_token.clone(),
            debug,
        })
    }

    fn transport_error(&self, e: reqwest::Error) -> AppError {
        let code = if e.is_timeout() {
            ErrorCode::UpstreamTimeout
        } else {
            ErrorCode::UpstreamUnreachable
        };
        tracing::warn!("Zermelo request failed: {}", e);
        AppError::new(code).with_debug_details(self.debug, e.to_string())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, path: &str, query: &[(&'static str, String)]) -> AppResult<RawReply> {
        let url = self.base_url.join(path).map_err(|e| {
            tracing::error!("Invalid Zermelo path {:?}: {}", path, e);
            AppError::new(ErrorCode::Default)
        })?;

        tracing::debug!("GET {} {:?}", url, query);

        let response = self
            .client
            .get(url)
            .query(query)
            .bearer_auth(&self.api_token)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(e))?;

        Ok(RawReply { status, body })
    }
}

// ============================================================================
// Envelope
// ============================================================================

/// One decoded Zermelo reply. A non-2xx `status` is not an error at this
/// level; callers decide what it means for their endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamResponse<T> {
    pub status: u16,
    pub message: String,
    pub details: String,
    pub data: Vec<T>,
}

impl<T> UpstreamResponse<T> {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    fn with_data<U>(self, data: Vec<U>) -> UpstreamResponse<U> {
        UpstreamResponse {
            status: self.status,
            message: self.message,
            details: self.details,
            data,
        }
    }
}

#[derive(Debug, Deserialize)]
struct EnvelopeWrapper {
    response: EnvelopeBody,
}

#[derive(Debug, Deserialize)]
struct EnvelopeBody {
    #[serde(default)]
    status: Option<u16>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    details: Option<String>,
    #[serde(default)]
    data: Value,
}

// ============================================================================
// Client
// ============================================================================

#[derive(Clone)]
pub struct ZermeloClient {
    transport: Arc<dyn Transport>,
    debug: bool,
}

impl ZermeloClient {
    pub fn new(transport: Arc<dyn Transport>, debug: bool) -> Self {
        Self { transport, debug }
    }

    pub fn from_config(config: &ZermeloConfig, debug: bool) -> AppResult<Self> {
        let transport = HttpTransport::new(config, debug)?;
        Ok(Self::new(Arc::new(transport), debug))
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&'static str, String)],
    ) -> AppResult<UpstreamResponse<T>> {
        let reply = self.transport.get(path, query).await?;
        self.decode(path, reply)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        path: &str,
        reply: RawReply,
    ) -> AppResult<UpstreamResponse<T>> {
        let http_ok = (200..300).contains(&reply.status);

        if reply.body.trim().is_empty() {
            if http_ok {
                tracing::warn!("Zermelo returned an empty body for {}", path);
                return Err(AppError::new(ErrorCode::NoData));
            }
            return Ok(UpstreamResponse {
                status: reply.status,
                message: String::new(),
                details: String::new(),
                data: Vec::new(),
            });
        }

        let envelope = match serde_json::from_str::<EnvelopeWrapper>(&reply.body) {
            Ok(wrapper) => wrapper.response,
            Err(e) if http_ok => {
                tracing::warn!("Unreadable Zermelo envelope for {}: {}", path, e);
                return Err(AppError::new(ErrorCode::UpstreamMalformedResponse)
                    .with_debug_details(self.debug, e.to_string()));
            }
            Err(_) => {
                return Ok(UpstreamResponse {
                    status: reply.status,
                    message: String::new(),
                    details: String::new(),
                    data: Vec::new(),
                });
            }
        };

        let status = if http_ok {
            envelope.status.unwrap_or(reply.status)
        } else {
            reply.status
        };
        let message = envelope.message.unwrap_or_default();
        let details = envelope.details.unwrap_or_default();

        if !(200..300).contains(&status) {
            tracing::debug!("Zermelo answered {} for {}: {}", status, path, message);
            return Ok(UpstreamResponse {
                status,
                message,
                details,
                data: Vec::new(),
            });
        }

        let data = match envelope.data {
            Value::Null => Vec::new(),
            value => serde_json::from_value::<Vec<T>>(value).map_err(|e| {
                tracing::warn!("Unexpected Zermelo record shape for {}: {}", path, e);
                AppError::new(ErrorCode::UpstreamMalformedResponse)
                    .with_debug_details(self.debug, e.to_string())
            })?,
        };

        Ok(UpstreamResponse {
            status,
            message,
            details,
            data,
        })
    }

    /// Appointments of `user` between two Unix timestamps.
    pub async fn get_schedule_appointments(
        &self,
        user: &str,
        start: i64,
        end: i64,
        kinds: Option<&str>,
        fields: Option<&str>,
    ) -> AppResult<UpstreamResponse<RawAppointment>> {
        if user.trim().is_empty() {
            return Err(AppError::new(ErrorCode::MissingParameters));
        }
        validate_window(start, end)?;

        let query = [
            ("valid", "true".to_string()),
            ("cancelled", "false".to_string()),
            ("user", user.trim().to_string()),
            ("start", start.to_string()),
            ("end", end.to_string()),
            (
                "type",
                kinds
                    .map(str::to_string)
                    .unwrap_or_else(AppointmentType::displayed_filter),
            ),
            ("fields", fields.unwrap_or(APPOINTMENT_FIELDS).to_string()),
        ];

        self.fetch("appointments", &query).await
    }

    pub async fn get_student_details(
        &self,
        student: &str,
        school_in_school_year: i64,
        fields: Option<&str>,
    ) -> AppResult<UpstreamResponse<RawStudent>> {
        if student.trim().is_empty() {
            return Err(AppError::new(ErrorCode::MissingParameters));
        }

        let query = [
            ("student", student.trim().to_string()),
            ("schoolInSchoolYear", school_in_school_year.to_string()),
            ("fields", fields.unwrap_or(STUDENT_FIELDS).to_string()),
        ];

        self.fetch("studentsindepartments", &query).await
    }

    pub async fn get_teacher_details(
        &self,
        employee: &str,
        school_in_school_year: i64,
        fields: Option<&str>,
    ) -> AppResult<UpstreamResponse<RawTeacher>> {
        if employee.trim().is_empty() {
            return Err(AppError::new(ErrorCode::MissingParameters));
        }

        let query = [
            ("employee", employee.trim().to_string()),
            ("schoolInSchoolYear", school_in_school_year.to_string()),
            ("fields", fields.unwrap_or(TEACHER_FIELDS).to_string()),
        ];

        self.fetch("contracts", &query).await
    }

    pub async fn get_schools_in_school_year(
        &self,
        year: i32,
    ) -> AppResult<UpstreamResponse<RawSchool>> {
        validate_year(year)?;
        self.fetch("schoolsinschoolyears", &[("schoolYear", year.to_string())])
            .await
    }

    pub async fn get_school_in_school_year(
        &self,
        id: i64,
        year: i32,
    ) -> AppResult<UpstreamResponse<RawSchool>> {
        validate_year(year)?;
        self.fetch(
            &format!("schoolsinschoolyears/{}", id),
            &[("schoolYear", year.to_string())],
        )
        .await
    }

    /// Schools the API token's owner is a member of. Tokens without
    /// memberships see every school of the year.
    pub async fn get_schools_assigned_to_token(
        &self,
        year: i32,
    ) -> AppResult<UpstreamResponse<RawSchool>> {
        validate_year(year)?;

        let me: UpstreamResponse<RawTokenUser> = self
            .fetch("users/~me", &[("fields", TOKEN_USER_FIELDS.to_string())])
            .await?;
        if !me.is_success() {
            return Ok(me.with_data(Vec::new()));
        }

        let memberships: Vec<i64> = me
            .data
            .first()
            .map(|user| user.employee_school_in_school_years.clone())
            .unwrap_or_default();

        if memberships.is_empty() {
            tracing::debug!("API token has no school memberships, listing all schools");
            return self.get_schools_in_school_year(year).await;
        }

        let lookups = memberships
            .iter()
            .map(|id| self.get_school_in_school_year(*id, year));

        let mut schools = Vec::new();
        for (id, result) in memberships.iter().zip(join_all(lookups).await) {
            match result {
                Ok(reply) if reply.is_success() => schools.extend(reply.data),
                Ok(reply) => {
                    tracing::debug!("Skipping school {}: upstream status {}", id, reply.status)
                }
                Err(e) => tracing::debug!("Skipping school {}: {}", id, e),
            }
        }

        Ok(me.with_data(schools))
    }
}

/// A schedule window must be ordered and at most [`MAX_WINDOW_SECS`] wide.
pub fn validate_window(start: i64, end: i64) -> AppResult<()> {
    let too_wide = end
        .checked_sub(start)
        .map_or(true, |width| width > MAX_WINDOW_SECS);
    if start > end || too_wide {
        return Err(AppError::new(ErrorCode::ScheduleInvalidDate));
    }
    Ok(())
}

fn validate_year(year: i32) -> AppResult<()> {
    if !(1000..=9999).contains(&year) {
        return Err(AppError::new(ErrorCode::ParameterInvalid)
            .with_details(format!("Schooljaar {} is ongeldig", year)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde_json::json;

    use super::*;

    /// Replies from a fixed table keyed by path and records every request.
    #[derive(Default)]
    struct FakeTransport {
        replies: Vec<(String, RawReply)>,
        calls: Mutex<Vec<(String, Vec<(&'static str, String)>)>>,
    }

    impl FakeTransport {
        fn reply(mut self, path: &str, status: u16, body: Value) -> Self {
            self.replies.push((
                path.to_string(),
                RawReply {
                    status,
                    body: body.to_string(),
                },
            ));
            self
        }

        fn raw(mut self, path: &str, status: u16, body: &str) -> Self {
            self.replies.push((
                path.to_string(),
                RawReply {
                    status,
                    body: body.to_string(),
                },
            ));
            self
        }

        fn calls(&self) -> Vec<(String, Vec<(&'static str, String)>)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for FakeTransport {
        async fn get(&self, path: &str, query: &[(&'static str, String)]) -> AppResult<RawReply> {
            self.calls
                .lock()
                .unwrap()
                .push((path.to_string(), query.to_vec()));
            self.replies
                .iter()
                .find(|(p, _)| p == path)
                .map(|(_, reply)| reply.clone())
                .ok_or_else(|| AppError::new(ErrorCode::UpstreamUnreachable))
        }
    }

    fn envelope(status: u16, data: Value) -> Value {
        json!({"response": {"status": status, "message": "", "details": "", "data": data}})
    }

    fn client(transport: FakeTransport) -> (ZermeloClient, Arc<FakeTransport>) {
        let transport = Arc::new(transport);
        (ZermeloClient::new(transport.clone(), false), transport)
    }

    #[test]
    fn window_boundaries() {
        assert!(validate_window(0, MAX_WINDOW_SECS).is_ok());
        assert!(validate_window(100, 100).is_ok());
        let err = validate_window(0, MAX_WINDOW_SECS + 1).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ScheduleInvalidDate);
        let err = validate_window(10, 5).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ScheduleInvalidDate);
        let err = validate_window(i64::MIN, i64::MAX).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ScheduleInvalidDate);
        assert!(validate_window(i64::MAX - 10, i64::MAX).is_ok());
    }

    #[tokio::test]
    async fn invalid_window_never_reaches_upstream() {
        let (client, transport) = client(FakeTransport::default());
        let err = client
            .get_schedule_appointments("1234", 0, MAX_WINDOW_SECS + 1, None, None)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ScheduleInvalidDate);
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn schedule_query_uses_defaults() {
        let (client, transport) =
            client(FakeTransport::default().reply("appointments", 200, envelope(200, json!([]))));

        let reply = client
            .get_schedule_appointments("1234", 100, 200, None, None)
            .await
            .unwrap();
        assert!(reply.is_success());
        assert!(reply.data.is_empty());

        let calls = transport.calls();
        let (path, query) = &calls[0];
        assert_eq!(path, "appointments");
        assert!(query.contains(&("valid", "true".to_string())));
        assert!(query.contains(&("cancelled", "false".to_string())));
        assert!(query.contains(&("user", "1234".to_string())));
        assert!(query.contains(&("type", AppointmentType::displayed_filter())));
        assert!(query.contains(&("fields", APPOINTMENT_FIELDS.to_string())));
    }

    #[tokio::test]
    async fn empty_user_is_missing_parameter() {
        let (client, _) = client(FakeTransport::default());
        let err = client
            .get_schedule_appointments("  ", 0, 1, None, None)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::MissingParameters);
    }

    #[tokio::test]
    async fn non_success_status_is_returned_not_raised() {
        let body = json!({"response": {"status": 403, "message": "Forbidden", "details": "no access", "data": []}});
        let (client, _) = client(FakeTransport::default().reply("appointments", 403, body));

        let reply = client
            .get_schedule_appointments("1234", 0, 1, None, None)
            .await
            .unwrap();
        assert_eq!(reply.status, 403);
        assert_eq!(reply.message, "Forbidden");
        assert_eq!(reply.details, "no access");
    }

    #[tokio::test]
    async fn non_success_without_envelope_keeps_http_status() {
        let (client, _) =
            client(FakeTransport::default().raw("appointments", 502, "<html>Bad gateway</html>"));
        let reply = client
            .get_schedule_appointments("1234", 0, 1, None, None)
            .await
            .unwrap();
        assert_eq!(reply.status, 502);
        assert!(reply.data.is_empty());
    }

    #[tokio::test]
    async fn empty_body_is_no_data() {
        let (client, _) = client(FakeTransport::default().raw("appointments", 200, ""));
        let err = client
            .get_schedule_appointments("1234", 0, 1, None, None)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::NoData);
    }

    #[tokio::test]
    async fn garbage_on_success_is_malformed() {
        let (client, _) = client(FakeTransport::default().raw("appointments", 200, "not json"));
        let err = client
            .get_schedule_appointments("1234", 0, 1, None, None)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::UpstreamMalformedResponse);
        assert_eq!(err.status(), axum::http::StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn wrong_record_shape_is_malformed() {
        let (client, _) = client(FakeTransport::default().reply(
            "appointments",
            200,
            envelope(200, json!([{"id": "abc"}])),
        ));
        let err = client
            .get_schedule_appointments("1234", 0, 1, None, None)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::UpstreamMalformedResponse);
    }

    #[tokio::test]
    async fn year_must_have_four_digits() {
        let (client, transport) = client(FakeTransport::default());
        let err = client.get_schools_in_school_year(24).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::ParameterInvalid);
        assert!(transport.calls().is_empty());
    }

    fn school(id: i64) -> Value {
        json!({"id": id, "school": 1, "year": 2025, "projectName": "p", "schoolName": "s"})
    }

    #[tokio::test]
    async fn token_memberships_are_looked_up_in_order() {
        let transport = FakeTransport::default()
            .reply(
                "users/~me",
                200,
                envelope(200, json!([{"code": "api", "employeeSchoolInSchoolYears": [7, 9, 8]}])),
            )
            .reply("schoolsinschoolyears/7", 200, envelope(200, json!([school(7)])))
            .reply("schoolsinschoolyears/8", 200, envelope(200, json!([school(8)])))
            .reply("schoolsinschoolyears/9", 404, envelope(404, json!([])));
        let (client, _) = client(transport);

        let reply = client.get_schools_assigned_to_token(2025).await.unwrap();
        assert!(reply.is_success());
        let ids: Vec<i64> = reply.data.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![7, 8]);
    }

    #[tokio::test]
    async fn token_without_memberships_lists_the_year() {
        let transport = FakeTransport::default()
            .reply("users/~me", 200, envelope(200, json!([{"code": "api"}])))
            .reply(
                "schoolsinschoolyears",
                200,
                envelope(200, json!([school(1), school(2)])),
            );
        let (client, transport) = client(transport);

        let reply = client.get_schools_assigned_to_token(2025).await.unwrap();
        assert_eq!(reply.data.len(), 2);
        let calls = transport.calls();
        assert_eq!(calls[1].1, vec![("schoolYear", "2025".to_string())]);
    }
}
