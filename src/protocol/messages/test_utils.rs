macro_rules! test_roundtrip {
    ($t:ty, $name:ident) => {
        proptest::proptest! {
            #[test]
            fn $name(orig: $t) {
                let mut buf = Vec::new();
                crate::codec::WriteType::write(&orig, &mut buf).unwrap();
                let restored = <$t as crate::codec::ReadType>::read(&mut std::io::Cursor::new(buf)).unwrap();
                proptest::prop_assert_eq!(orig, restored);
            }
        }
    };
}

pub(crate) use test_roundtrip;
