use crate::net::{Dpid, Endpoint, MacAddr, MacParseError, PortNo};

#[test]
fn mac_parse_and_display() {
    let m: MacAddr = "00:1A:2b:3c:4d:5e".parse().unwrap();
    assert_eq!(m, MacAddr([0x00, 0x1a, 0x2b, 0x3c, 0x4d, 0x5e]));
    assert_eq!(m.to_string(), "00:1a:2b:3c:4d:5e");
    assert_eq!("00-1a-2b-3c-4d-5e".parse::<MacAddr>().unwrap(), m);
}

#[test]
fn mac_parse_rejects_malformed() {
    for bad in ["", "00:11:22:33:44", "00:11:22:33:44:55:66", "0:11:22:33:44:55", "zz:11:22:33:44:55"] {
        assert_eq!(bad.parse::<MacAddr>(), Err(MacParseError(bad.to_string())));
    }
}

#[test]
fn mac_special_values() {
    assert!("ff:ff:ff:ff:ff:ff".parse::<MacAddr>().unwrap().is_broadcast());
    assert!(MacAddr::ZERO.is_zero());
    assert!(!MacAddr::from_u64(1).is_broadcast());
    assert_eq!(MacAddr::from_u64(0x0402).to_string(), "00:00:00:00:04:02");
}

#[test]
fn mac_serde_uses_string_form() {
    let m = MacAddr::from_u64(0xabcdef);
    let json = serde_json::to_string(&m).unwrap();
    assert_eq!(json, "\"00:00:00:ab:cd:ef\"");
    assert_eq!(serde_json::from_str::<MacAddr>(&json).unwrap(), m);
    assert!(serde_json::from_str::<MacAddr>("\"nope\"").is_err());
}

#[test]
fn display_forms() {
    assert_eq!(Dpid(7).to_string(), "s7");
    assert_eq!(Endpoint::new(Dpid(1), PortNo(2)).to_string(), "s1:2");
    assert_eq!(PortNo::LOCAL.to_string(), "LOCAL");
    assert_eq!(PortNo::ALL.to_string(), "ALL");
    assert!(PortNo::LOCAL.is_reserved());
    assert!(!PortNo(48).is_reserved());
}

#[test]
fn endpoints_order_by_switch_then_port() {
    let mut eps = vec![
        Endpoint::new(Dpid(2), PortNo(1)),
        Endpoint::new(Dpid(1), PortNo(3)),
        Endpoint::new(Dpid(1), PortNo(2)),
    ];
    eps.sort();
    assert_eq!(
        eps,
        [
            Endpoint::new(Dpid(1), PortNo(2)),
            Endpoint::new(Dpid(1), PortNo(3)),
            Endpoint::new(Dpid(2), PortNo(1)),
        ]
    );
}
