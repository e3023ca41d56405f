//! Opaque payloads the router forwards to the pool.

use alloy_primitives::{Address, Bytes, B256};

/// Deposit payload: the LP token recipient, left padded to one word.
pub fn deposit_data(recipient: Address) -> Bytes {
    Bytes::copy_from_slice(recipient.into_word().as_slice())
}

/// Withdrawal payload: the recipient word followed by the withdraw mode word.
pub fn withdrawal_data(recipient: Address, mode: u8) -> Bytes {
    let mut data = Vec::with_capacity(64);
    data.extend_from_slice(recipient.into_word().as_slice());
    data.extend_from_slice(B256::with_last_byte(mode).as_slice());
    data.into()
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{address, hex};

    use super::*;

    const RECIPIENT: Address = address!("1234567890abcdef1234567890abcdef12345678");

    #[test]
    fn test_deposit_data_is_padded_recipient() {
        let data = deposit_data(RECIPIENT);

        assert_eq!(
            data.to_vec(),
            hex!("0000000000000000000000001234567890abcdef1234567890abcdef12345678").to_vec()
        );
    }

    #[test]
    fn test_withdrawal_data_appends_mode() {
        let data = withdrawal_data(RECIPIENT, 1);

        assert_eq!(data.len(), 64);
        assert_eq!(data[..32].to_vec(), deposit_data(RECIPIENT).to_vec());
        assert_eq!(
            data[32..].to_vec(),
            hex!("0000000000000000000000000000000000000000000000000000000000000001").to_vec()
        );
    }
}
