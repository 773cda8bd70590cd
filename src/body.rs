use bytes::{BufMut, Bytes, BytesMut};
use http::header::{CONTENT_TYPE, HeaderValue};

use crate::error::TransportError;
use crate::options::{FilePart, RequestData, RequestOptions};

pub(crate) struct EncodedBody {
    pub(crate) bytes: Bytes,
    pub(crate) content_type: Option<HeaderValue>,
}

/// Picks and encodes the request body: files, then data, then json.
pub(crate) fn encode_body(options: &RequestOptions) -> Result<Option<EncodedBody>, TransportError> {
    if let Some(files) = options.files.as_deref().filter(|files| !files.is_empty()) {
        let fields = match &options.data {
            Some(RequestData::Form(pairs)) => pairs.as_slice(),
            _ => &[],
        };
        return encode_multipart(fields, files).map(Some);
    }

    if let Some(data) = &options.data {
        let encoded = match data {
            RequestData::Bytes(bytes) => EncodedBody {
                bytes: bytes.clone(),
                content_type: None,
            },
            RequestData::Text(text) => EncodedBody {
                bytes: Bytes::from(text.clone()),
                content_type: None,
            },
            RequestData::Form(pairs) => {
                let encoded = serde_urlencoded::to_string(pairs)
                    .map_err(|source| TransportError::SerializeForm { source })?;
                EncodedBody {
                    bytes: Bytes::from(encoded),
                    content_type: Some(HeaderValue::from_static(
                        "application/x-www-form-urlencoded",
                    )),
                }
            }
        };
        return Ok(Some(encoded));
    }

    if let Some(json) = &options.json {
        let body =
            serde_json::to_vec(json).map_err(|source| TransportError::SerializeJson { source })?;
        return Ok(Some(EncodedBody {
            bytes: Bytes::from(body),
            content_type: Some(HeaderValue::from_static("application/json")),
        }));
    }

    Ok(None)
}

fn encode_multipart(
    fields: &[(String, String)],
    files: &[FilePart],
) -> Result<EncodedBody, TransportError> {
    let boundary = format!("reqdispatch-{:032x}", rand::random::<u128>());
    let mut body = BytesMut::new();

    for (name, value) in fields {
        put_part_head(&mut body, &boundary, name, None, None);
        body.put_slice(value.as_bytes());
        body.put_slice(b"\r\n");
    }
    for file in files {
        put_part_head(
            &mut body,
            &boundary,
            &file.field,
            Some(file.file_name.as_deref().unwrap_or(&file.field)),
            Some(
                file.content_type
                    .as_deref()
                    .unwrap_or("application/octet-stream"),
            ),
        );
        body.put_slice(&file.content);
        body.put_slice(b"\r\n");
    }
    body.put_slice(format!("--{boundary}--\r\n").as_bytes());

    let content_type = HeaderValue::from_str(&format!("multipart/form-data; boundary={boundary}"))
        .map_err(|source| TransportError::InvalidHeaderValue {
            name: CONTENT_TYPE.as_str().to_owned(),
            source,
        })?;
    Ok(EncodedBody {
        bytes: body.freeze(),
        content_type: Some(content_type),
    })
}

fn put_part_head(
    body: &mut BytesMut,
    boundary: &str,
    name: &str,
    file_name: Option<&str>,
    content_type: Option<&str>,
) {
    let mut head = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"{}\"",
        escape_quoted(name)
    );
    if let Some(file_name) = file_name {
        head.push_str(&format!("; filename=\"{}\"", escape_quoted(file_name)));
    }
    head.push_str("\r\n");
    if let Some(content_type) = content_type {
        head.push_str(&format!("Content-Type: {content_type}\r\n"));
    }
    head.push_str("\r\n");
    body.put_slice(head.as_bytes());
}

fn escape_quoted(value: &str) -> String {
    value
        .replace('"', "%22")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}
