use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        BlurestError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(BlurestError::load("x").to_string().contains("load error:"));
    assert!(
        BlurestError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
    assert!(
        BlurestError::from(DecodeError::Overflow)
            .to_string()
            .contains("decode error:")
    );
}

#[test]
fn generation_wraps_and_exposes_root_cause() {
    let inner = BlurestError::from(DecodeError::InvalidSymbol {
        symbol: '!',
        position: 3,
    });
    let err = BlurestError::generation("row 0", inner);

    let msg = err.to_string();
    assert!(msg.starts_with("generation error: row 0:"));
    assert!(msg.contains("'!'"));
    assert!(msg.contains("position 3"));

    assert!(matches!(
        err.root_cause(),
        BlurestError::Decode(DecodeError::InvalidSymbol { position: 3, .. })
    ));
    assert!(std::error::Error::source(&err).is_some());
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = BlurestError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
