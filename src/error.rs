use std::fmt;

use axum::{
    extract::rejection::{PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::Value;

use crate::config::ConfigError;
use crate::response::ApiResponse;
use crate::services::zermelo::UpstreamResponse;

/// Symbolic error codes understood by the kiosk frontend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    AuthDenied,
    AuthMissingToken,
    AuthInvalidToken,
    ZermeloApiError,
    ZermeloUserNotFound,
    ScheduleInvalidDate,
    MissingParameters,
    ParameterInvalid,
    EndpointNotFound,
    SchoolNotFound,
    NoData,
    ConfigMissing,
    ConfigNotWritable,
    UpstreamTimeout,
    UpstreamUnreachable,
    UpstreamMalformedResponse,
    Default,
}

/// Catalog entry: the status, message and default details of an error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorDefinition {
    pub status: StatusCode,
    pub message: &'static str,
    pub details: &'static str,
}

impl ErrorCode {
    pub const ALL: [ErrorCode; 17] = [
        ErrorCode::AuthDenied,
        ErrorCode::AuthMissingToken,
        ErrorCode::AuthInvalidToken,
        ErrorCode::ZermeloApiError,
        ErrorCode::ZermeloUserNotFound,
        ErrorCode::ScheduleInvalidDate,
        ErrorCode::MissingParameters,
        ErrorCode::ParameterInvalid,
        ErrorCode::EndpointNotFound,
        ErrorCode::SchoolNotFound,
        ErrorCode::NoData,
        ErrorCode::ConfigMissing,
        ErrorCode::ConfigNotWritable,
        ErrorCode::UpstreamTimeout,
        ErrorCode::UpstreamUnreachable,
        ErrorCode::UpstreamMalformedResponse,
        ErrorCode::Default,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::AuthDenied => "AUTH_DENIED",
            ErrorCode::AuthMissingToken => "AUTH_MISSING_TOKEN",
            ErrorCode::AuthInvalidToken => "AUTH_INVALID_TOKEN",
            ErrorCode::ZermeloApiError => "ZERMELO_API_ERROR",
            ErrorCode::ZermeloUserNotFound => "ZERMELO_USER_NOT_FOUND",
            ErrorCode::ScheduleInvalidDate => "SCHEDULE_INVALID_DATE",
            ErrorCode::MissingParameters => "MISSING_PARAMETERS",
            ErrorCode::ParameterInvalid => "PARAMETER_INVALID",
            ErrorCode::EndpointNotFound => "ENDPOINT_NOT_FOUND",
            ErrorCode::SchoolNotFound => "SCHOOL_NOT_FOUND",
            ErrorCode::NoData => "NO_DATA",
            ErrorCode::ConfigMissing => "CONFIG_MISSING",
            ErrorCode::ConfigNotWritable => "CONFIG_NOT_WRITABLE",
            ErrorCode::UpstreamTimeout => "UPSTREAM_TIMEOUT",
            ErrorCode::UpstreamUnreachable => "UPSTREAM_UNREACHABLE",
            ErrorCode::UpstreamMalformedResponse => "UPSTREAM_MALFORMED_RESPONSE",
            ErrorCode::Default => "DEFAULT",
        }
    }

    /// Resolve a symbolic code such as `"AUTH_DENIED"`.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|code| code.as_str() == symbol)
    }

    pub fn definition(&self) -> ErrorDefinition {
        let (status, message, details) = match self {
            ErrorCode::AuthDenied => (
                StatusCode::UNAUTHORIZED,
                "Toegang geweigerd",
                "Je hebt geen toegang tot deze resource",
            ),
            ErrorCode::AuthMissingToken => (
                StatusCode::UNAUTHORIZED,
                "Toegang geweigerd",
                "Er is een token nodig om deze actie uit te voeren",
            ),
            ErrorCode::AuthInvalidToken => (
                StatusCode::UNAUTHORIZED,
                "Toegang geweigerd",
                "Ongeldig token",
            ),
            ErrorCode::ZermeloApiError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Er is een fout opgetreden bij het ophalen van data van Zermelo",
                "De Zermelo API gaf een fout terug",
            ),
            ErrorCode::ZermeloUserNotFound => (
                StatusCode::NOT_FOUND,
                "Gebruiker niet gevonden",
                "De gebruiker kon niet worden gevonden in de Zermelo API",
            ),
            ErrorCode::ScheduleInvalidDate => (
                StatusCode::BAD_REQUEST,
                "Ongeldige datum",
                "De startdatum ligt na de einddatum of het verschil tussen start- en einddatum is te groot",
            ),
            ErrorCode::MissingParameters => (
                StatusCode::BAD_REQUEST,
                "Ontbrekende parameters",
                "Niet alle vereiste parameters zijn meegegeven",
            ),
            ErrorCode::ParameterInvalid => (
                StatusCode::BAD_REQUEST,
                "Ongeldige parameter",
                "De parameter is ongeldig",
            ),
            ErrorCode::EndpointNotFound => (
                StatusCode::NOT_FOUND,
                "Endpoint niet gevonden",
                "Het opgevraagde endpoint bestaat niet",
            ),
            ErrorCode::SchoolNotFound => (
                StatusCode::NOT_FOUND,
                "School niet gevonden",
                "Er zijn geen scholen gevonden in de Zermelo API",
            ),
            ErrorCode::NoData => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Er is een fout opgetreden in de communicatie met het netwerk",
                "Controleer de internetverbinding van uw server",
            ),
            ErrorCode::ConfigMissing => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Configuratie niet gevonden",
                "Kopieer .env.example naar .env en configureer de instellingen",
            ),
            ErrorCode::ConfigNotWritable => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Configuratie vereist aanpassingen",
                "De configuratie moet worden bijgewerkt maar het bestand is niet schrijfbaar",
            ),
            ErrorCode::UpstreamTimeout => (
                StatusCode::GATEWAY_TIMEOUT,
                "Zermelo reageert niet op tijd",
                "De Zermelo API gaf geen antwoord binnen de ingestelde tijd",
            ),
            ErrorCode::UpstreamUnreachable => (
                StatusCode::BAD_GATEWAY,
                "Zermelo is niet bereikbaar",
                "Er kon geen verbinding worden gemaakt met de Zermelo API",
            ),
            ErrorCode::UpstreamMalformedResponse => (
                StatusCode::BAD_GATEWAY,
                "Onverwacht antwoord van Zermelo",
                "Het antwoord van de Zermelo API kon niet worden gelezen",
            ),
            ErrorCode::Default => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Er is een onbekende fout opgetreden",
                "Er is een onbekende fout opgetreden",
            ),
        };

        ErrorDefinition {
            status,
            message,
            details,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A catalog error with optional per-instance status and details.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{code} ({status}): {details}")]
pub struct AppError {
    code: ErrorCode,
    status: StatusCode,
    details: String,
}

impl AppError {
    pub fn new(code: ErrorCode) -> Self {
        let definition = code.definition();
        Self {
            code,
            status: definition.status,
            details: definition.details.to_string(),
        }
    }

    /// Build an error from a symbolic code. Unknown symbols become `DEFAULT`.
    pub fn from_symbol(symbol: &str) -> Self {
        match ErrorCode::from_symbol(symbol) {
            Some(code) => Self::new(code),
            None => {
                tracing::warn!("Unknown error code {:?}, falling back to DEFAULT", symbol);
                Self::new(ErrorCode::Default)
            }
        }
    }

    /// Wrap a failed Zermelo reply. Upstream text is only exposed in debug mode.
    pub fn zermelo(status: u16, message: &str, details: &str, debug: bool) -> Self {
        let status = StatusCode::from_u16(status)
            .ok()
            .filter(|s| s.is_client_error() || s.is_server_error())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let details = if debug {
            format!("{}. Details: {}", message, details)
        } else {
            String::new()
        };

        Self::new(ErrorCode::ZermeloApiError)
            .with_status(status)
            .with_details(details)
    }

    pub fn from_zermelo<T>(reply: &UpstreamResponse<T>, debug: bool) -> Self {
        Self::zermelo(reply.status, &reply.message, &reply.details, debug)
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = details.into();
        self
    }

    /// Attach technical details only when `debug` is set.
    pub fn with_debug_details(self, debug: bool, details: impl Into<String>) -> Self {
        if debug {
            self.with_details(details)
        } else {
            self
        }
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &'static str {
        self.code.definition().message
    }

    pub fn details(&self) -> &str {
        &self.details
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!("{}", self);
        } else {
            tracing::debug!("{}", self);
        }

        ApiResponse::new(self.status, Value::Array(Vec::new()))
            .with_error_code(self.code)
            .with_message(self.message())
            .with_details(self.details)
            .into_response()
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        tracing::error!("Failed to serialize response: {:?}", e);
        AppError::new(ErrorCode::Default)
    }
}

impl From<ConfigError> for AppError {
    fn from(e: ConfigError) -> Self {
        AppError::new(ErrorCode::ConfigMissing).with_details(e.to_string())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::new(ErrorCode::ParameterInvalid).with_details(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::new(ErrorCode::ParameterInvalid).with_details(rejection.body_text())
    }
}

pub type AppResult<T> = Result<T, AppError>;
