/// Number of digits covered by the check digit: `YYMMDDSSS`.
pub const PAYLOAD_LEN: usize = 9;

const WEIGHTS: [u8; PAYLOAD_LEN] = [2, 1, 2, 1, 2, 1, 2, 1, 2];

/// Computes the modulus-10 check digit for a 9-digit payload.
///
/// Each digit is multiplied by its weight from `[2,1,2,1,2,1,2,1,2]`;
/// two-digit products are folded into the sum of their digits. The check
/// digit is `(10 - sum % 10) % 10`.
///
/// Every element of `payload` must be a decimal digit (`0..=9`).
///
/// # Example
/// ```
/// use testdatagen::checksum;
///
/// // 811218-987?
/// assert_eq!(checksum(&[8, 1, 1, 2, 1, 8, 9, 8, 7]), 6);
/// ```
pub const fn checksum(payload: &[u8; PAYLOAD_LEN]) -> u8 {
    let mut sum: u32 = 0;
    let mut i = 0;
    while i < PAYLOAD_LEN {
        let product = payload[i] * WEIGHTS[i];
        sum += if product >= 10 {
            (product / 10 + product % 10) as u32
        } else {
            product as u32
        };
        i += 1;
    }
    ((10 - sum % 10) % 10) as u8
}

/// Returns `true` if `check` is the check digit of `payload`.
pub const fn verify(payload: &[u8; PAYLOAD_LEN], check: u8) -> bool {
    checksum(payload) == check
}

/// Builds the checksum payload from birth-date fields and a serial.
///
/// Only the last two digits of `year` take part.
pub const fn payload(year: i32, month: u32, day: u32, serial: u16) -> [u8; PAYLOAD_LEN] {
    let yy = year.rem_euclid(100) as u32;
    let serial = serial as u32;
    [
        (yy / 10) as u8,
        (yy % 10) as u8,
        (month / 10) as u8,
        (month % 10) as u8,
        (day / 10) as u8,
        (day % 10) as u8,
        (serial / 100 % 10) as u8,
        (serial / 10 % 10) as u8,
        (serial % 10) as u8,
    ]
}
