//! Parser for ARN-like Lambda target identifiers.
//!
//! Lambda accepts three shapes for a function identifier:
//!  - bare name: `Thumbnail`
//!  - partial ARN: `123456789012:Thumbnail`
//!  - full ARN: `arn:aws:lambda:us-west-2:123456789012:function:Thumbnail`
//!
//! Parsing never fails: an empty or unrecognizable string yields `None` and
//! the caller keeps using the raw identifier as-is.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArnInfo {
    pub region: Option<String>,
    pub account_id: Option<String>,
    pub function_name: String,
}

pub fn parse(arn: &str) -> Option<ArnInfo> {
    let mut rest = arn.strip_prefix("arn:aws:lambda:").unwrap_or(arn);

    let region = consume_segment(&mut rest, is_region_token);
    let account_id = consume_segment(&mut rest, is_account_token);
    rest = rest.strip_prefix("function:").unwrap_or(rest);

    let name_len = rest
        .bytes()
        .take_while(|byte| byte.is_ascii_alphanumeric() || *byte == b'-' || *byte == b'_')
        .count();
    if name_len == 0 {
        return None;
    }

    Some(ArnInfo {
        region,
        account_id,
        function_name: rest[..name_len].to_string(),
    })
}

/// Consumes `<token>:` from the front of `rest` when `accept` matches the
/// token, returning the token without its trailing colon.
fn consume_segment(rest: &mut &str, accept: fn(&str) -> bool) -> Option<String> {
    let (token, remainder) = rest.split_once(':')?;
    if !accept(token) {
        return None;
    }
    *rest = remainder;
    Some(token.to_string())
}

/// Region tokens look like `us-east-1`: two lowercase letters, a lowercase
/// word, and a single digit, hyphen-separated.
fn is_region_token(token: &str) -> bool {
    let mut parts = token.split('-');
    let (Some(prefix), Some(area), Some(digit), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return false;
    };
    prefix.len() == 2
        && prefix.bytes().all(|byte| byte.is_ascii_lowercase())
        && !area.is_empty()
        && area.bytes().all(|byte| byte.is_ascii_lowercase())
        && digit.len() == 1
        && digit.bytes().all(|byte| byte.is_ascii_digit())
}

fn is_account_token(token: &str) -> bool {
    token.len() == 12 && token.bytes().all(|byte| byte.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_arn() {
        let info = parse("arn:aws:lambda:us-west-2:123456789012:function:MyFunctionName")
            .expect("full arn should parse");
        assert_eq!(info.region.as_deref(), Some("us-west-2"));
        assert_eq!(info.account_id.as_deref(), Some("123456789012"));
        assert_eq!(info.function_name, "MyFunctionName");
    }

    #[test]
    fn parses_partial_arn() {
        let info = parse("123456789012:MyFunctionName").expect("partial arn should parse");
        assert_eq!(info.region, None);
        assert_eq!(info.account_id.as_deref(), Some("123456789012"));
        assert_eq!(info.function_name, "MyFunctionName");
    }

    #[test]
    fn parses_bare_function_name() {
        let info = parse("MyFunctionName").expect("bare name should parse");
        assert_eq!(info.region, None);
        assert_eq!(info.account_id, None);
        assert_eq!(info.function_name, "MyFunctionName");
    }

    #[test]
    fn empty_input_yields_no_match() {
        assert_eq!(parse(""), None);
    }

    #[test]
    fn garbage_input_yields_no_match() {
        assert_eq!(parse(":#!!"), None);
    }

    #[test]
    fn region_must_end_in_single_digit() {
        let info = parse("arn:aws:lambda:eu-central-1:123456789012:function:fn")
            .expect("full arn should parse");
        assert_eq!(info.region.as_deref(), Some("eu-central-1"));
        assert!(!is_region_token("us-east-10"));
        assert!(!is_region_token("useast-1"));
    }

    #[test]
    fn account_without_region_keeps_region_unset() {
        let info = parse("arn:aws:lambda:123456789012:function:fn")
            .expect("arn without region should still parse");
        assert_eq!(info.region, None);
        assert_eq!(info.account_id.as_deref(), Some("123456789012"));
        assert_eq!(info.function_name, "fn");
    }

    #[test]
    fn name_allows_hyphen_and_underscore() {
        let info = parse("my-function_name").expect("name should parse");
        assert_eq!(info.function_name, "my-function_name");
    }
}
