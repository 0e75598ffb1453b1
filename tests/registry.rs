use ios::flags::{IOS_F_CREATE, IOS_F_READ, IOS_F_TRUNCATE, IOS_F_WRITE};
use ios::{Endian, IosFlags, NegEncoding, Registry};

#[test]
fn memory_space_round_trips_through_the_registry() {
    let mut reg = Registry::new();
    let id = reg.open("*scratch*", IosFlags::default(), true).unwrap();

    reg.write_uint(id, 0, 32, Endian::Msb, 0xdeadbeef).unwrap();
    assert_eq!(reg.read_uint(id, 0, 32, Endian::Msb).unwrap(), 0xdeadbeef);

    reg.write_int(id, 32, 16, Endian::Lsb, NegEncoding::Twos, -1).unwrap();
    assert_eq!(
        reg.read_int(id, 32, 16, Endian::Lsb, NegEncoding::Twos).unwrap(),
        -1
    );

    reg.write_string(id, 48, b"poke").unwrap();
    assert_eq!(reg.read_string(id, 48).unwrap(), b"poke\0");
}

#[test]
fn file_space_persists_across_a_fresh_registry() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("space.bin");
    let flags = IosFlags::new(IOS_F_READ | IOS_F_WRITE | IOS_F_CREATE | IOS_F_TRUNCATE);

    {
        let mut reg = Registry::new();
        let id = reg.open(path.to_str().unwrap(), flags, true).unwrap();
        reg.write_uint(id, 3, 12, Endian::Msb, 0xABC).unwrap();
    }

    let mut reg = Registry::new();
    let id = reg
        .open(path.to_str().unwrap(), IosFlags::new(IOS_F_READ | IOS_F_WRITE), true)
        .unwrap();
    assert_eq!(reg.read_uint(id, 3, 12, Endian::Msb).unwrap(), 0xABC);
}

#[test]
fn bias_is_applied_before_every_access() {
    let mut reg = Registry::new();
    let id = reg.open("*biased*", IosFlags::default(), true).unwrap();
    reg.set_bias(id, 4096).unwrap();

    reg.write_uint(id, 0, 8, Endian::Msb, 0x7f).unwrap();
    assert_eq!(reg.read_uint(id, 0, 8, Endian::Msb).unwrap(), 0x7f);

    reg.set_bias(id, 0).unwrap();
    assert_eq!(reg.read_uint(id, 4096, 8, Endian::Msb).unwrap(), 0x7f);
}

#[test]
fn multiple_spaces_are_independent_and_enumerable() {
    let mut reg = Registry::new();
    let a = reg.open("*a*", IosFlags::default(), false).unwrap();
    let b = reg.open("*b*", IosFlags::default(), false).unwrap();

    reg.write_uint(a, 0, 8, Endian::Msb, 1).unwrap();
    reg.write_uint(b, 0, 8, Endian::Msb, 2).unwrap();
    assert_eq!(reg.read_uint(a, 0, 8, Endian::Msb).unwrap(), 1);
    assert_eq!(reg.read_uint(b, 0, 8, Endian::Msb).unwrap(), 2);

    // Enumeration is head-first: the most recently opened space comes first,
    // matching `ios_map`'s traversal of `io_list`.
    let handlers: Vec<&str> = reg.iter().map(|s| s.handler()).collect();
    assert_eq!(handlers, vec!["*b*", "*a*"]);
}

#[test]
fn closing_a_space_removes_it_from_search() {
    let mut reg = Registry::new();
    let id = reg.open("*gone*", IosFlags::default(), true).unwrap();
    reg.close(id).unwrap();
    assert_eq!(reg.search("*gone*"), None);
    assert!(reg.read_uint(id, 0, 8, Endian::Msb).is_err());
}

#[test]
fn nbd_handler_is_recognized_but_rejects_truncate() {
    let mut reg = Registry::new();
    let flags = IosFlags::new(IOS_F_WRITE | IOS_F_TRUNCATE);
    let err = reg.open("nbd://127.0.0.1:1/export", flags, false).unwrap_err();
    assert_eq!(err.code(), ios::error::IOS_EFLAGS);
}
