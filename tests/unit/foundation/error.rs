use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        ChoreoError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(ChoreoError::seek("x").to_string().contains("seek error:"));
    assert!(
        ChoreoError::subscription("x")
            .to_string()
            .contains("subscription error:")
    );
    assert!(ChoreoError::tween("x").to_string().contains("tween error:"));
    assert!(
        ChoreoError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = ChoreoError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}

#[test]
fn anyhow_converts_into_other() {
    fn fails() -> ChoreoResult<()> {
        Err(anyhow::anyhow!("handler blew up"))?;
        Ok(())
    }
    let err = fails().unwrap_err();
    assert!(matches!(err, ChoreoError::Other(_)));
    assert_eq!(err.to_string(), "handler blew up");
}
