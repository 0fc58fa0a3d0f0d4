use global_hotkey::hotkey::Code;
use sleeplock::config_file::Config;

#[test]
fn test_letter_keys_map_to_codes() {
    assert_eq!(Config::parse_key_string("A").unwrap(), Code::KeyA);
    assert_eq!(Config::parse_key_string("K").unwrap(), Code::KeyK);
    assert_eq!(Config::parse_key_string("Z").unwrap(), Code::KeyZ);
}

#[test]
fn test_lowercase_letters_accepted() {
    assert_eq!(Config::parse_key_string("k").unwrap(), Code::KeyK);
    assert_eq!(Config::parse_key_string("q").unwrap(), Code::KeyQ);
}

#[test]
fn test_non_letters_rejected() {
    assert!(Config::parse_key_string("").is_err());
    assert!(Config::parse_key_string("1").is_err());
    assert!(Config::parse_key_string("KK").is_err());
    assert!(Config::parse_key_string(" ").is_err());
    assert!(Config::parse_key_string("é").is_err());
}

