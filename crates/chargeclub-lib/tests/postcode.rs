use chargeclub_lib::is_valid_postcode;

#[test]
fn accepts_each_outward_code_shape() {
    for code in ["M1 1AE", "M60 1NW", "CR2 6XH", "DN55 1PT", "W1A 0AX", "EC1A 1BB"] {
        assert!(is_valid_postcode(code), "{code} should be accepted");
    }
}

#[test]
fn accepts_lower_case_input() {
    assert!(is_valid_postcode("sw1a 1aa"));
    assert!(is_valid_postcode("eh1 1yz"));
}

#[test]
fn rejects_malformed_codes() {
    for code in [
        "",
        " ",
        "INVALID",
        "SW1A1AA",
        "SW1A  1AA",
        " SW1A 1AA",
        "SW1A 1AA ",
        "ABC1 1AA",
        "1A 1AA",
        "SW1A 1A",
        "SW1A 11A",
        "SW1A 1AAA",
    ] {
        assert!(!is_valid_postcode(code), "{code:?} should be rejected");
    }
}

#[test]
fn rejects_excluded_inward_letters() {
    for letter in ['C', 'I', 'K', 'M', 'O', 'V'] {
        let code = format!("SW1A 1A{letter}");
        assert!(!is_valid_postcode(&code), "{code} should be rejected");
        let code = format!("SW1A 1{letter}A");
        assert!(!is_valid_postcode(&code), "{code} should be rejected");
    }
}

#[test]
fn non_ascii_input_does_not_panic() {
    assert!(!is_valid_postcode("SW1Ä 1AA"));
    assert!(!is_valid_postcode("ＳＷ1 1AA"));
}
