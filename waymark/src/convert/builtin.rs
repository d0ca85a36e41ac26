//! Converters for `String`, `bool`, `char` and the numeric primitives.

use crate::convert::{ConvertError, ConverterRegistry};

macro_rules! from_str_converters {
    ($registry:expr, $($t:ty),+) => {
        $( $registry.register_from_str::<$t>(); )+
    };
}

pub(super) fn register(registry: &mut ConverterRegistry) {
    registry.register::<String, String, _>(|s: &String| Ok(s.clone()));
    registry.register::<String, bool, _>(|s: &String| parse_bool(s));
    registry.register::<String, char, _>(|s: &String| {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(ConvertError::unparsable::<char>(s)),
        }
    });

    from_str_converters!(
        registry, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64
    );
}

fn parse_bool(s: &str) -> Result<bool, ConvertError> {
    match s.trim() {
        v if v.eq_ignore_ascii_case("true") => Ok(true),
        v if v.eq_ignore_ascii_case("false") => Ok(false),
        _ => Err(ConvertError::unparsable::<bool>(s)),
    }
}
