#[cfg(test)]
mod tests {
    use rstest::rstest;
    use wasm_builder::parser::module::{ConstExpr, ValueType};
    use wasm_builder::parser::{self, reader::Reader, CompileError, DecodeError, ValidationError};

    fn with_header(sections: &[u8]) -> Vec<u8> {
        let mut bytes = b"\0asm".to_vec();
        bytes.extend_from_slice(&1u32.to_le_bytes());
        bytes.extend_from_slice(sections);
        bytes
    }

    fn decode(bytes: &[u8]) -> Result<parser::module::Module, DecodeError> {
        parser::parse("test", &mut Reader::new(bytes.to_vec()))
    }

    #[rstest]
    #[case::empty(&[], "BadMagic")]
    #[case::wrong_magic(b"\0wsm\x01\0\0\0", "BadMagic")]
    #[case::version_2(b"\0asm\x02\0\0\0", "UnknownVersion")]
    #[case::truncated_version(b"\0asm\x01\0", "UnexpectedEnd")]
    fn malformed_header(#[case] bytes: &[u8], #[case] expected: &str) {
        let err = decode(bytes).unwrap_err();
        assert!(format!("{err:?}").starts_with(expected), "got {err:?}");
    }

    #[rstest]
    // section length runs past the end of the input
    #[case::truncated_section(&[0x06, 0x05, 0x01, 0x7f], "UnexpectedEnd")]
    // global section declares 2 entries but holds 1
    #[case::missing_entry(&[0x06, 0x06, 0x02, 0x7f, 0x00, 0x41, 0x00, 0x0b], "UnexpectedEnd")]
    // declared length 7, entry uses 6
    #[case::length_too_long(&[0x06, 0x07, 0x01, 0x7f, 0x00, 0x41, 0x00, 0x0b, 0x00], "SectionSizeMismatch")]
    #[case::out_of_order(&[0x07, 0x01, 0x00, 0x06, 0x01, 0x00], "SectionOutOfOrder")]
    #[case::repeated(&[0x06, 0x01, 0x00, 0x06, 0x01, 0x00], "SectionOutOfOrder")]
    #[case::type_section(&[0x01, 0x01, 0x00], "UnsupportedSection")]
    #[case::code_section(&[0x0a, 0x01, 0x00], "UnsupportedSection")]
    #[case::unknown_section(&[0x0d, 0x00], "UnknownSection")]
    #[case::func_import(&[0x02, 0x06, 0x01, 0x01, b'm', 0x01, b'f', 0x00], "UnsupportedExternal")]
    #[case::memory_export(&[0x07, 0x05, 0x01, 0x01, b'm', 0x02, 0x00], "UnsupportedExternal")]
    #[case::bad_value_type(&[0x06, 0x06, 0x01, 0x7b, 0x00, 0x41, 0x00, 0x0b], "InvalidValueType")]
    #[case::bad_mutability(&[0x06, 0x06, 0x01, 0x7f, 0x02, 0x41, 0x00, 0x0b], "MalformedMutability")]
    #[case::non_const_opcode(&[0x06, 0x06, 0x01, 0x7f, 0x00, 0x6a, 0x00, 0x0b], "IllegalConstOpcode")]
    #[case::two_instructions(&[0x06, 0x08, 0x01, 0x7f, 0x00, 0x41, 0x00, 0x41, 0x00, 0x0b], "ConstExprNotTerminated")]
    #[case::overlong_leb(&[0x06, 0x0a, 0x01, 0x7f, 0x00, 0x41, 0x80, 0x80, 0x80, 0x80, 0x80, 0x00], "Malformed")]
    fn malformed_sections(#[case] sections: &[u8], #[case] expected: &str) {
        let err = decode(&with_header(sections)).unwrap_err();
        assert!(format!("{err:?}").starts_with(expected), "got {err:?}");
    }

    #[test]
    fn custom_sections_between_known_sections() {
        let bytes = with_header(&[
            0x00, 0x04, 0x03, b'a', b'b', b'c', //
            0x06, 0x06, 0x01, 0x7c, 0x00, 0x23, 0x00, 0x0b, //
            0x00, 0x02, 0x00, 0xff,
        ]);
        let module = decode(&bytes).unwrap();
        assert_eq!(module.globals.len(), 1);
        assert_eq!(module.globals[0].init, ConstExpr::GlobalGet(0));
        assert_eq!(module.globals[0].global_type.value_type, ValueType::F64);
    }

    #[test]
    fn decoded_but_invalid() {
        // global.get of a local global
        let bytes = with_header(&[0x06, 0x06, 0x01, 0x7c, 0x00, 0x23, 0x00, 0x0b]);
        assert!(matches!(
            parser::compile("test", &bytes),
            Err(CompileError::Validation(ValidationError::NonImportedGlobalGet(0)))
        ));

        // mutable import
        let bytes = with_header(&[0x02, 0x08, 0x01, 0x01, b'm', 0x01, b'x', 0x03, 0x7f, 0x01]);
        assert!(matches!(
            parser::compile("test", &bytes),
            Err(CompileError::Validation(ValidationError::MutableGlobalImport { .. }))
        ));
    }

    #[test]
    fn compile_error_wraps_decode_error() {
        let err = parser::compile("test", b"nope").unwrap_err();
        assert!(matches!(err, CompileError::Decode(DecodeError::BadMagic)));
        assert_eq!(err.to_string(), "compile error: magic header not detected");
    }
}
