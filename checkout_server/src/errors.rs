use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use checkout_engine::{CheckoutError, MetadataError, OrderFlowError, PricingError};
use log::*;
use stripe_tools::WebhookError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Invalid request. {0}")]
    InvalidRequest(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("The payment provider could not process the request. {0}")]
    PaymentProviderError(String),
    #[error("Webhook rejected. {0}")]
    WebhookRejected(#[from] WebhookError),
    #[error("Forbidden. {0}")]
    ForbiddenPeer(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::PaymentProviderError(_) => StatusCode::BAD_GATEWAY,
            Self::WebhookRejected(e) => match e {
                WebhookError::MissingHeader => StatusCode::BAD_REQUEST,
                WebhookError::MalformedHeader(_) => StatusCode::BAD_REQUEST,
                WebhookError::MalformedPayload(_) => StatusCode::BAD_REQUEST,
                WebhookError::InvalidSignature => StatusCode::UNAUTHORIZED,
                WebhookError::StaleTimestamp { .. } => StatusCode::UNAUTHORIZED,
            },
            Self::ForbiddenPeer(_) => StatusCode::FORBIDDEN,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

impl From<PricingError> for ServerError {
    fn from(e: PricingError) -> Self {
        match e {
            PricingError::ItemNotFound(_) => Self::NoRecordFound(e.to_string()),
            PricingError::BackendError(_) => {
                error!("💻️ Pricing backend failure. {e}");
                Self::BackendError(e.to_string())
            },
            _ => Self::InvalidRequest(e.to_string()),
        }
    }
}

impl From<CheckoutError> for ServerError {
    fn from(e: CheckoutError) -> Self {
        match e {
            CheckoutError::Pricing(e) => e.into(),
            CheckoutError::Metadata(MetadataError::CartTooLarge { .. } | MetadataError::ValueTooLong { .. }) => {
                Self::InvalidRequest(e.to_string())
            },
            CheckoutError::Metadata(_) => Self::BackendError(e.to_string()),
            CheckoutError::Authorization(e) => Self::PaymentProviderError(e.to_string()),
            CheckoutError::InvalidAmount(_) => Self::InvalidRequest(e.to_string()),
        }
    }
}

impl From<OrderFlowError> for ServerError {
    fn from(e: OrderFlowError) -> Self {
        Self::BackendError(e.to_string())
    }
}

#[cfg(test)]
mod test {
    use checkout_engine::AuthorizationError;

    use super::*;

    #[test]
    fn status_codes() {
        let status = |e: ServerError| e.status_code();
        let pricing = |e: PricingError| status(CheckoutError::Pricing(e).into());
        assert_eq!(pricing(PricingError::EmptyCart), StatusCode::BAD_REQUEST);
        assert_eq!(pricing(PricingError::ItemNotFound("x".into())), StatusCode::NOT_FOUND);
        assert_eq!(pricing(PricingError::BackendError("down".into())), StatusCode::INTERNAL_SERVER_ERROR);
        let declined = CheckoutError::Authorization(AuthorizationError::AuthorizationFailed("declined".into()));
        assert_eq!(status(declined.into()), StatusCode::BAD_GATEWAY);
        let too_large = CheckoutError::Metadata(MetadataError::CartTooLarge { chunks: 60, max: 42 });
        assert_eq!(status(too_large.into()), StatusCode::BAD_REQUEST);
        assert_eq!(status(WebhookError::InvalidSignature.into()), StatusCode::UNAUTHORIZED);
        assert_eq!(status(WebhookError::StaleTimestamp { timestamp: 0, now: 1000 }.into()), StatusCode::UNAUTHORIZED);
        assert_eq!(status(WebhookError::MissingHeader.into()), StatusCode::BAD_REQUEST);
    }
}
