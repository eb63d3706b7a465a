//! Service identifiers and wire constants

/// Signing name and endpoint prefix of the control plane.
pub const SERVICE_NAME: &str = "quicksight";

/// Fault code for a missing subscription.
pub const RESOURCE_NOT_FOUND: &str = "ResourceNotFoundException";

/// Header carrying the fault code on error responses.
pub const ERROR_TYPE_HEADER: &str = "x-amzn-errortype";

/// Header carrying the request id on every response.
pub const REQUEST_ID_HEADER: &str = "x-amzn-requestid";

/// Regional endpoint for the control plane.
pub fn default_endpoint(region: &str) -> String {
    format!("https://{SERVICE_NAME}.{region}.amazonaws.com")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_endpoint_is_regional() {
        assert_eq!(
            default_endpoint("eu-west-1"),
            "https://quicksight.eu-west-1.amazonaws.com"
        );
    }
}
