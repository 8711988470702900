use chrono::{DateTime, Utc};
use rand::Rng;

const SUFFIX_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const SUFFIX_LEN: usize = 6;

/// `ORD-<yyyymmddHHMMSS>-<6 uppercase alphanumerics>`. Uniqueness is enforced
/// by the store.
pub fn generate_order_number(now: DateTime<Utc>) -> String {
  let mut rng = rand::thread_rng();
  let suffix: String = (0..SUFFIX_LEN)
    .map(|_| SUFFIX_CHARSET[rng.gen_range(0..SUFFIX_CHARSET.len())] as char)
    .collect();
  format!("ORD-{}-{}", now.format("%Y%m%d%H%M%S"), suffix)
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;

  #[test]
  fn has_expected_shape() {
    let now = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
    let number = generate_order_number(now);
    assert!(number.starts_with("ORD-20240309140507-"));
    let suffix = number.rsplit('-').next().unwrap();
    assert_eq!(suffix.len(), 6);
    assert!(suffix.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
  }
}
