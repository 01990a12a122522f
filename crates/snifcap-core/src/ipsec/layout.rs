pub const TUNNEL_NAME_PREFIX: &str = "name=";
pub const TUNNEL_VERSION_TOKEN: &str = "ver=1";
pub const ADDRESS_ARROW: &str = "->";
pub const PORT_SEPARATOR: char = ':';

pub const ENC_TAG: &str = "enc:";
pub const DEC_TAG: &str = "dec:";
pub const SPI_PREFIX: &str = "spi=";
pub const ESP_PREFIX: &str = "esp=";
pub const KEY_PREFIX: &str = "key=";
pub const AH_PREFIX: &str = "ah=";

pub const ADDRESS_FAMILY: &str = "IPv4";

pub const ESP_SA_FILE: &str = "esp_sa";
pub const ESP_SA_HOME_DIR: &str = ".wireshark";
pub const ESP_SA_APPDATA_DIR: &str = "Wireshark";

/// `(esp code, key length tag) -> esp_sa encryption label`.
pub const CIPHERS: &[(&str, &str, &str)] = &[
    ("aes", "16", "AES-CBC [RFC3602]"),
    ("aes", "24", "AES-CBC [RFC3602]"),
    ("aes", "32", "AES-CBC [RFC3602]"),
    ("3des", "24", "TripleDES-CBC [RFC2451]"),
    ("des", "8", "DES-CBC [RFC2405]"),
    ("null", "0", "NULL"),
];

/// `(ah code, key length tag) -> esp_sa authentication label`.
pub const HASHES: &[(&str, &str, &str)] = &[
    ("sha1", "20", "HMAC-SHA-1-96 [RFC2404]"),
    ("md5", "16", "HMAC-MD5-96 [RFC2403]"),
    ("sha256", "32", "HMAC-SHA-256-128 [RFC4868]"),
    ("sha384", "48", "HMAC-SHA-384-192 [RFC4868]"),
    ("sha512", "64", "HMAC-SHA-512-256 [RFC4868]"),
];

pub fn cipher_label(code: &str, key_len: &str) -> Option<&'static str> {
    lookup(CIPHERS, code, key_len)
}

pub fn hash_label(code: &str, key_len: &str) -> Option<&'static str> {
    lookup(HASHES, code, key_len)
}

fn lookup(
    table: &'static [(&str, &str, &str)],
    code: &str,
    key_len: &str,
) -> Option<&'static str> {
    table
        .iter()
        .find(|(known_code, known_len, _)| *known_code == code && *known_len == key_len)
        .map(|(_, _, label)| *label)
}
