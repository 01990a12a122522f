use super::TunnelDirection;
use super::error::FieldError;
use super::layout;

/// `name=<id> ver=1 ... <src>-><dst> ...`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TunnelHeader<'a> {
    pub name: &'a str,
    /// Source and destination with any `:port` removed, `None` when the line
    /// has no `src->dst` token.
    pub endpoints: Option<(&'a str, &'a str)>,
}

pub fn parse_tunnel_header<'a>(tokens: &[&'a str]) -> Option<TunnelHeader<'a>> {
    let name = tokens.first()?.strip_prefix(layout::TUNNEL_NAME_PREFIX)?;
    if tokens.get(1) != Some(&layout::TUNNEL_VERSION_TOKEN) {
        return None;
    }
    let endpoints = tokens.iter().skip(2).find_map(|token| split_endpoints(token));
    Some(TunnelHeader { name, endpoints })
}

fn split_endpoints(token: &str) -> Option<(&str, &str)> {
    let (src, dst) = token.split_once(layout::ADDRESS_ARROW)?;
    let (src, dst) = (strip_port(src), strip_port(dst));
    if src.is_empty() || dst.is_empty() {
        return None;
    }
    Some((src, dst))
}

fn strip_port(address: &str) -> &str {
    address
        .split_once(layout::PORT_SEPARATOR)
        .map_or(address, |(host, _)| host)
}

pub fn direction_tag(token: &str) -> Option<TunnelDirection> {
    match token {
        layout::ENC_TAG => Some(TunnelDirection::Enc),
        layout::DEC_TAG => Some(TunnelDirection::Dec),
        _ => None,
    }
}

/// `spi=<spi> esp=<code> key=<len> <hex>` (tokens after the direction tag).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CipherFields<'a> {
    pub spi: &'a str,
    pub code: &'a str,
    pub key_len: &'a str,
    pub key: &'a str,
}

pub fn parse_cipher_fields<'a>(tokens: &[&'a str]) -> Result<CipherFields<'a>, FieldError> {
    Ok(CipherFields {
        spi: prefixed(tokens.first(), layout::SPI_PREFIX, "spi")?,
        code: prefixed(tokens.get(1), layout::ESP_PREFIX, "esp")?,
        key_len: prefixed(tokens.get(2), layout::KEY_PREFIX, "keylength")?,
        key: tokens.get(3).copied().ok_or(FieldError { field: "key" })?,
    })
}

/// `ah=<code> key=<len> <hex>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthFields<'a> {
    pub code: &'a str,
    pub key_len: &'a str,
    pub key: &'a str,
}

pub fn parse_auth_fields<'a>(tokens: &[&'a str]) -> Result<AuthFields<'a>, FieldError> {
    Ok(AuthFields {
        code: prefixed(tokens.first(), layout::AH_PREFIX, "ah")?,
        key_len: prefixed(tokens.get(1), layout::KEY_PREFIX, "authkeylength")?,
        key: tokens.get(2).copied().ok_or(FieldError { field: "authkey" })?,
    })
}

fn prefixed<'a>(
    token: Option<&&'a str>,
    prefix: &str,
    field: &'static str,
) -> Result<&'a str, FieldError> {
    token
        .and_then(|token| token.strip_prefix(prefix))
        .ok_or(FieldError { field })
}

#[cfg(test)]
mod tests {
    use super::{
        TunnelHeader, direction_tag, parse_auth_fields, parse_cipher_fields, parse_tunnel_header,
    };
    use crate::ipsec::TunnelDirection;
    use crate::ipsec::error::FieldError;

    fn tokens(line: &str) -> Vec<&str> {
        line.split_whitespace().collect()
    }

    #[test]
    fn header_with_ports() {
        let line = "name=vpn1 ver=1 serial=1 10.0.0.1:0->10.0.0.2:0 tun_id=10.0.0.2";
        assert_eq!(
            parse_tunnel_header(&tokens(line)),
            Some(TunnelHeader {
                name: "vpn1",
                endpoints: Some(("10.0.0.1", "10.0.0.2")),
            })
        );
    }

    #[test]
    fn header_requires_version_token() {
        assert_eq!(parse_tunnel_header(&tokens("name=vpn1 ver=2 a->b")), None);
        assert_eq!(parse_tunnel_header(&tokens("name=vpn1")), None);
        assert_eq!(parse_tunnel_header(&tokens("id=vpn1 ver=1 a->b")), None);
    }

    #[test]
    fn header_without_endpoints() {
        let header = parse_tunnel_header(&tokens("name=vpn1 ver=1 serial=2")).unwrap();
        assert_eq!(header.endpoints, None);
    }

    #[test]
    fn direction_tags() {
        assert_eq!(direction_tag("enc:"), Some(TunnelDirection::Enc));
        assert_eq!(direction_tag("dec:"), Some(TunnelDirection::Dec));
        assert_eq!(direction_tag("enc"), None);
    }

    #[test]
    fn cipher_fields() {
        let fields = parse_cipher_fields(&tokens("spi=ab12 esp=aes key=16 00112233")).unwrap();
        assert_eq!(fields.spi, "ab12");
        assert_eq!(fields.code, "aes");
        assert_eq!(fields.key_len, "16");
        assert_eq!(fields.key, "00112233");
    }

    #[test]
    fn cipher_fields_report_first_bad_field() {
        let err = parse_cipher_fields(&tokens("spi=ab12 enc=aes key=16 00")).unwrap_err();
        assert_eq!(err, FieldError { field: "esp" });
        let err = parse_cipher_fields(&tokens("spi=ab12 esp=aes key=16")).unwrap_err();
        assert_eq!(err, FieldError { field: "key" });
    }

    #[test]
    fn auth_fields() {
        let fields = parse_auth_fields(&tokens("ah=sha1 key=20 ffee")).unwrap();
        assert_eq!((fields.code, fields.key_len, fields.key), ("sha1", "20", "ffee"));
        let err = parse_auth_fields(&tokens("mac=sha1 key=20 ffee")).unwrap_err();
        assert_eq!(err, FieldError { field: "ah" });
    }
}
