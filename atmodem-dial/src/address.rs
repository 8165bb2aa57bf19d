use crate::DialError;

/// Split a dial string of the form `host:port`.
///
/// Surrounding whitespace is ignored. The host must be non-empty and the
/// port a non-zero decimal number.
pub fn parse_address(number: &str) -> Result<(String, u16), DialError> {
    let text = number.trim();
    let malformed = || DialError::Address(text.to_owned());

    let (host, port) = text.split_once(':').ok_or_else(malformed)?;
    if host.is_empty() || port.contains(':') {
        return Err(malformed());
    }

    match port.parse::<u16>() {
        Ok(port) if port != 0 => Ok((host.to_owned(), port)),
        _ => Err(malformed()),
    }
}
