use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        DrapeError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(DrapeError::decode("x").to_string().contains("decode error:"));
    assert!(DrapeError::render("x").to_string().contains("render error:"));
    assert!(
        DrapeError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = DrapeError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
