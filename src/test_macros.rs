macro_rules! impl_arbitrary {
    ($type:ident$(<$($gen:ident),*>)?, $($field:ident),*) => {
        #[cfg(test)]
        impl$(<$($gen: 'static),*>)?  quickcheck::Arbitrary for $type$(<$($gen),*>)? {
            fn arbitrary(gen: &mut quickcheck::Gen) -> Self {
                let _ = &gen;
                $type {
                    $(
                        $field: crate::test_macros::qc_help::Hack::new(0).arbitrary(gen),
                    )*
                }
            }
        }
    };
}
pub(crate) use impl_arbitrary;

#[cfg(test)]
macro_rules! check_roundtrip {
    ($name:ident, $ty:ty) => {
        mod $name {
            #[allow(unused)]
            use super::*;
            quickcheck::quickcheck! {
                fn roundtrip(val: $ty) -> bool {
                    let mut bytes = Vec::new();
                    val.serialize(&mut bytes);
                    let val2 = <$ty>::deserialize(&mut &*bytes).unwrap();

                    assert_eq!(val2, val);
                    true
                }
            }

            quickcheck::quickcheck! {
                fn garbage(val: $ty, modify: Vec<(usize, u8)>, insert: Vec<(usize, u8)>, delete: Vec<usize>) -> bool {
                    let mut bytes = Vec::new();
                    val.serialize(&mut bytes);
                    if !bytes.is_empty() {
                        for (pos, byte) in modify {
                            let pos = pos % bytes.len();
                            bytes[pos] = byte;
                        }
                    }

                    for (pos, byte) in insert {
                        let pos = pos % (bytes.len() + 1);
                        bytes.insert(pos, byte);
                    }

                    for pos in delete {
                        if bytes.is_empty() {
                            break
                        }
                        let pos = pos % bytes.len();
                        bytes.remove(pos);
                    }

                    let _ = <$ty>::deserialize(&mut &*bytes);

                    true
                }
            }
        }
    }
}

#[cfg(test)]
pub(crate) use check_roundtrip;

/// Module containing a horribly-looking hack to seamlessly implement `Arbitrary`.
///
/// What we want to achieve is to have `impl_arbitrary!` macro where we only define the name of the
/// struct we want to implement `Arbitrary` for and the list of fields. We don't want to repeat
/// field types.
///
/// Since we don't want to repeat the field types we have to rely on inference and because Rust
/// lacks specialization we have to somehow resolve potential conflict during inference. To solve
/// this we define a trait on arbitrary integers and abuse the fallback to `i32` to pick the
/// preferred impl - in this case upstream since we assume they can do something better.
///
/// The usage can be seen in `impl_arbitrary` macro. It shouldn't be needed outside of macros.
#[cfg(test)]
pub(crate) mod qc_help {
    use alloy_primitives::{Address, U256};

    /// Our version of the `Arbitrary` trait.
    ///
    /// The compiler allows us to impl this for foreign types.
    pub(crate) trait Arbitrary: 'static + Sized {
        fn arbitrary(gen: &mut quickcheck::Gen) -> Self;
    }

    impl Arbitrary for Address {
        fn arbitrary(gen: &mut quickcheck::Gen) -> Self {
            use quickcheck::Arbitrary;

            let mut bytes = [0u8; 20];
            for byte in &mut bytes {
                *byte = u8::arbitrary(gen);
            }
            Address::new(bytes)
        }
    }

    impl Arbitrary for U256 {
        fn arbitrary(gen: &mut quickcheck::Gen) -> Self {
            use quickcheck::Arbitrary;

            let mut bytes = [0u8; 32];
            for byte in &mut bytes {
                *byte = u8::arbitrary(gen);
            }
            U256::from_be_bytes(bytes)
        }
    }

    impl<T: Arbitrary> Arbitrary for Option<T> {
        fn arbitrary(gen: &mut quickcheck::Gen) -> Self {
            use quickcheck::Arbitrary;

            if bool::arbitrary(gen) {
                Some(T::arbitrary(gen))
            } else {
                None
            }
        }
    }

    impl<T: Arbitrary> Arbitrary for Vec<T> {
        fn arbitrary(gen: &mut quickcheck::Gen) -> Self {
            use quickcheck::Arbitrary;

            let size = loop {
                let size = usize::arbitrary(gen);
                if size < 20 {
                    break size;
                }
            };
            let mut vec = Vec::with_capacity(size);
            for _ in 0..size {
                vec.push(T::arbitrary(gen));
            }
            vec
        }
    }

    /// This ZST handles dispatch to the appropriate trait.
    pub(crate) struct Hack<T>(core::marker::PhantomData<T>);

    impl<T> Hack<T> {
        /// Create the value.
        ///
        /// The value is unused, we just want the compiler to use `{integer}` for `T`.
        pub(crate) fn new(_: T) -> Self {
            Hack(Default::default())
        }

        /// Generate arbitrary value.
        pub(crate) fn arbitrary<U>(&self, gen: &mut quickcheck::Gen) -> U where T: HorribleArbitrary<U> {
            T::horrible_arbitrary(gen)
        }
    }

    /// Arbitrary trait that uses `Self` as marker type only.
    ///
    /// This trait is implemented for all `i32` and `u8` depending on which trait `T` implements.
    pub(crate) trait HorribleArbitrary<T> {
        fn horrible_arbitrary(gen: &mut quickcheck::Gen) -> T;
    }

    impl<T: quickcheck::Arbitrary> HorribleArbitrary<T> for i32 {
        fn horrible_arbitrary(gen: &mut quickcheck::Gen) -> T {
            T::arbitrary(gen)
        }
    }

    impl<T: Arbitrary> HorribleArbitrary<T> for u8 {
        fn horrible_arbitrary(gen: &mut quickcheck::Gen) -> T {
            T::arbitrary(gen)
        }
    }
}

/// Abbreviation for out arbitrary trait.
#[cfg(test)]
pub(crate) fn arbitrary<T: qc_help::Arbitrary>(gen: &mut quickcheck::Gen) -> T {
    T::arbitrary(gen)
}
