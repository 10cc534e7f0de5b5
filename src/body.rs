//! Decoding of request bodies.
//!
//! The identification endpoint accepts an image either as a
//! `multipart/form-data` upload with a part named `image`, or as a JSON
//! document whose `image` field holds base64 text. The recommendation
//! endpoint only accepts JSON. In both cases the gateway may have
//! base64-encoded the whole body on the way in.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::Value;

use crate::{error::ApiError, event::InboundRequest};

const IMAGE_DISPOSITION: &[u8] = b"Content-Disposition: form-data; name=\"image\"";
const HEADER_END: &[u8] = b"\r\n\r\n";

fn no_image() -> ApiError {
    ApiError::bad_request("No image found in request")
}

fn invalid_json() -> ApiError {
    ApiError::bad_request("Invalid JSON in request body")
}

/// The request body with any gateway-level base64 encoding undone.
fn decoded_body(req: &InboundRequest) -> Result<Option<Vec<u8>>, ApiError> {
    match &req.body {
        Some(body) if req.is_base64 && !body.is_empty() => {
            let decoded =
                decode_base64(body).map_err(|_| ApiError::bad_request("Invalid base64 encoding"))?;
            Ok(Some(decoded))
        }
        other => Ok(other.clone()),
    }
}

/// Extract the raw image bytes for an identification request.
pub fn image_payload(req: &InboundRequest, max_bytes: usize) -> Result<Vec<u8>, ApiError> {
    let body = decoded_body(req)?.unwrap_or_default();
    let content_type = req.content_type();

    let image = if content_type.contains("multipart/form-data") {
        let boundary = multipart_boundary(content_type)
            .ok_or_else(|| ApiError::bad_request("Missing multipart boundary"))?;
        multipart_image(&body, boundary).ok_or_else(no_image)?
    } else if content_type.contains("application/json") || content_type.is_empty() {
        let doc: Value = serde_json::from_slice(&body).map_err(|_| invalid_json())?;
        let field = doc.get("image").ok_or_else(no_image)?;
        decode_image_field(field)?
    } else {
        return Err(ApiError::bad_request(format!(
            "Unsupported content type: {content_type}"
        )));
    };

    if image.len() > max_bytes {
        return Err(ApiError::bad_request(format!(
            "Image file too large. Please upload an image under {}.",
            describe_size(max_bytes)
        )));
    }

    Ok(image)
}

/// Extract the `plantName` of a recommendation request.
pub fn plant_name(req: &InboundRequest) -> Result<String, ApiError> {
    let body = decoded_body(req)?.unwrap_or_else(|| b"{}".to_vec());
    let doc: Value = serde_json::from_slice(&body).map_err(|_| invalid_json())?;

    doc.get("plantName")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .ok_or_else(|| ApiError::bad_request("Plant name is required"))
}

fn multipart_boundary(content_type: &str) -> Option<&str> {
    let (_, rest) = content_type.split_once("boundary=")?;
    let boundary = rest.split(';').next()?.trim().trim_matches('"');

    if boundary.is_empty() {
        None
    } else {
        Some(boundary)
    }
}

/// Find the `image` part of a multipart body and return everything after
/// its header block.
fn multipart_image(body: &[u8], boundary: &str) -> Option<Vec<u8>> {
    let delimiter = format!("--{boundary}");

    let found = split_bytes(body, delimiter.as_bytes()).find_map(|part| {
        find_bytes(part, IMAGE_DISPOSITION)?;

        let start = match find_bytes(part, HEADER_END)? {
            0 => return None,
            n => n + HEADER_END.len(),
        };

        let data = &part[start..];

        if data.is_empty() {
            None
        } else {
            Some(data.to_vec())
        }
    });
    found
}

fn decode_image_field(field: &Value) -> Result<Vec<u8>, ApiError> {
    let text = field.as_str().ok_or_else(|| {
        ApiError::bad_request("Error decoding image: expected a base64 string")
    })?;

    // Browsers like to hand us data URLs straight from a FileReader.
    let text = match text.strip_prefix("data:") {
        Some(rest) => rest.split_once(";base64,").map_or(text, |(_, data)| data),
        None => text,
    };

    decode_base64(text.as_bytes())
        .map_err(|e| ApiError::bad_request(format!("Error decoding image: {e}")))
}

/// Standard base64, ignoring the line breaks of MIME-wrapped text.
fn decode_base64(text: &[u8]) -> Result<Vec<u8>, base64::DecodeError> {
    let compact: Vec<u8> = text
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    STANDARD.decode(compact)
}

fn describe_size(n: usize) -> String {
    const MB: usize = 1024 * 1024;

    if n >= MB && n % MB == 0 {
        format!("{}MB", n / MB)
    } else {
        format!("{n} bytes")
    }
}

fn find_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }

    haystack.windows(needle.len()).position(|w| w == needle)
}

fn split_bytes<'a>(mut haystack: &'a [u8], sep: &'a [u8]) -> impl Iterator<Item = &'a [u8]> {
    let mut done = false;

    std::iter::from_fn(move || {
        if done {
            return None;
        }

        match find_bytes(haystack, sep) {
            Some(i) => {
                let piece = &haystack[..i];
                haystack = &haystack[i + sep.len()..];
                Some(piece)
            }

            None => {
                done = true;
                Some(haystack)
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Headers;

    const MAX: usize = 5 * 1024 * 1024;

    fn request(content_type: Option<&str>, body: Option<&[u8]>, is_base64: bool) -> InboundRequest {
        let mut headers = Headers::default();

        if let Some(ct) = content_type {
            headers.insert("Content-Type", ct);
        }

        InboundRequest {
            method: "POST".to_owned(),
            path: "/identify-plant".to_owned(),
            headers,
            body: body.map(|b| b.to_vec()),
            is_base64,
        }
    }

    fn multipart_body(name: &str, data: &[u8]) -> Vec<u8> {
        let mut b = Vec::new();
        b.extend_from_slice(b"--XyZ\r\n");
        b.extend_from_slice(b"Content-Disposition: form-data; name=\"note\"\r\n\r\nhello\r\n");
        b.extend_from_slice(b"--XyZ\r\n");
        b.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{name}\"; filename=\"leaf.jpg\"\r\n")
                .as_bytes(),
        );
        b.extend_from_slice(b"Content-Type: image/jpeg\r\n\r\n");
        b.extend_from_slice(data);
        b.extend_from_slice(b"--XyZ--\r\n");
        b
    }

    fn message(e: ApiError) -> String {
        assert_eq!(e.status_code(), 400);
        e.to_string()
    }

    #[test]
    fn multipart_image_part() {
        let body = multipart_body("image", b"\xff\xd8\x00\x01binary");
        let req = request(Some("multipart/form-data; boundary=\"XyZ\""), Some(&body[..]), false);
        let image = image_payload(&req, MAX).unwrap();
        assert_eq!(image, b"\xff\xd8\x00\x01binary");
    }

    #[test]
    fn multipart_base64_encoded_by_gateway() {
        let body = STANDARD.encode(multipart_body("image", b"abc"));
        let req = request(
            Some("multipart/form-data; boundary=XyZ"),
            Some(body.as_bytes()),
            true,
        );
        assert_eq!(image_payload(&req, MAX).unwrap(), b"abc");
    }

    #[test]
    fn multipart_without_image_part() {
        let body = multipart_body("photo", b"abc");
        let req = request(Some("multipart/form-data; boundary=XyZ"), Some(&body[..]), false);
        assert_eq!(message(image_payload(&req, MAX).unwrap_err()), "No image found in request");
    }

    #[test]
    fn multipart_without_boundary() {
        let req = request(Some("multipart/form-data"), Some(b"whatever"), false);
        assert_eq!(message(image_payload(&req, MAX).unwrap_err()), "Missing multipart boundary");
    }

    #[test]
    fn invalid_gateway_base64() {
        let req = request(Some("application/json"), Some(b"!!not base64!!"), true);
        assert_eq!(message(image_payload(&req, MAX).unwrap_err()), "Invalid base64 encoding");
    }

    #[test]
    fn json_image_field() {
        let req = request(
            Some("application/json; charset=utf-8"),
            Some(br#"{"image": "aGVsbG8="}"#),
            false,
        );
        assert_eq!(image_payload(&req, MAX).unwrap(), b"hello");

        // An absent content type is treated as JSON.
        let req = request(None, Some(br#"{"image": "data:image/png;base64,aGVsbG8="}"#), false);
        assert_eq!(image_payload(&req, MAX).unwrap(), b"hello");
    }

    #[test]
    fn wrapped_base64() {
        let req = request(
            Some("application/json"),
            Some(b"{\"image\": \"aGVs\\r\\nbG8=\\n\"}"),
            false,
        );
        assert_eq!(image_payload(&req, MAX).unwrap(), b"hello");

        let wrapped = "eyJwbGFu\r\ndE5hbWUi\r\nOiAiSmFk\r\nZSJ9";
        let req = request(None, Some(wrapped.as_bytes()), true);
        assert_eq!(plant_name(&req).unwrap(), "Jade");
    }

    #[test]
    fn json_errors() {
        let req = request(Some("application/json"), Some(b"{not json"), false);
        assert_eq!(message(image_payload(&req, MAX).unwrap_err()), "Invalid JSON in request body");

        let req = request(Some("application/json"), Some(br#"{"picture": "aGVsbG8="}"#), false);
        assert_eq!(message(image_payload(&req, MAX).unwrap_err()), "No image found in request");

        let req = request(Some("application/json"), Some(br#"{"image": "%%%"}"#), false);
        assert!(message(image_payload(&req, MAX).unwrap_err()).starts_with("Error decoding image:"));

        let req = request(Some("application/json"), None, false);
        assert_eq!(message(image_payload(&req, MAX).unwrap_err()), "Invalid JSON in request body");
    }

    #[test]
    fn unsupported_content_type() {
        let req = request(Some("text/plain"), Some(b"hi"), false);
        assert_eq!(
            message(image_payload(&req, MAX).unwrap_err()),
            "Unsupported content type: text/plain"
        );
    }

    #[test]
    fn oversized_image() {
        let req = request(Some("application/json"), Some(br#"{"image": "aGVsbG8="}"#), false);
        assert!(message(image_payload(&req, 4).unwrap_err()).starts_with("Image file too large"));
        assert_eq!(describe_size(5 * 1024 * 1024), "5MB");
    }

    #[test]
    fn plant_names() {
        let req = request(Some("application/json"), Some(br#"{"plantName": "Boston Fern"}"#), false);
        assert_eq!(plant_name(&req).unwrap(), "Boston Fern");

        let encoded = STANDARD.encode(r#"{"plantName": "Jade"}"#);
        let req = request(None, Some(encoded.as_bytes()), true);
        assert_eq!(plant_name(&req).unwrap(), "Jade");

        let bodies: [&[u8]; 3] = [br#"{"plantName": ""}"#, br#"{}"#, br#"{"plantName": 3}"#];
        for body in bodies {
            let req = request(None, Some(body), false);
            assert_eq!(message(plant_name(&req).unwrap_err()), "Plant name is required");
        }

        let req = request(None, None, false);
        assert_eq!(message(plant_name(&req).unwrap_err()), "Plant name is required");

        let req = request(None, Some(b"plantName=x"), false);
        assert_eq!(message(plant_name(&req).unwrap_err()), "Invalid JSON in request body");
    }

    #[test]
    fn byte_splitting() {
        let parts: Vec<&[u8]> = split_bytes(b"a--b--c", b"--").collect();
        assert_eq!(parts, vec![&b"a"[..], &b"b"[..], &b"c"[..]]);
        assert_eq!(find_bytes(b"abc", b"bc"), Some(1));
        assert_eq!(find_bytes(b"a", b"abc"), None);
    }
}
