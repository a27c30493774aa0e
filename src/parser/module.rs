use std::fmt;

use crate::parser::encoding::{OP_F32_CONST, OP_F64_CONST, OP_GLOBAL_GET, OP_I32_CONST, OP_I64_CONST};

/// A decoded (or built) module restricted to globals: imported globals,
/// locally defined globals and their exports.
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub name: String,
    pub imports: Vec<GlobalImport>,
    pub globals: Vec<Global>,
    pub exports: Vec<Export>,
}

impl Module {
    pub fn new(name: &str) -> Module {
        Module {
            name: name.to_string(),
            imports: Vec::new(),
            globals: Vec::new(),
            exports: Vec::new(),
        }
    }

    /// Number of entries in the global index space (imports first).
    pub fn global_count(&self) -> usize {
        self.imports.len() + self.globals.len()
    }

    /// Looks up the type of a global by its index in the global index space.
    pub fn global_type(&self, index: u32) -> Option<GlobalType> {
        let index = index as usize;
        if index < self.imports.len() {
            return Some(self.imports[index].global_type);
        }
        self.globals
            .get(index - self.imports.len())
            .map(|g| g.global_type)
    }

    pub fn is_imported_global(&self, index: u32) -> bool {
        (index as usize) < self.imports.len()
    }

    /// Renders a listing of globals and exports, one per line.
    pub fn to_details_string(&self) -> String {
        let mut result = String::new();
        if !self.imports.is_empty() {
            result.push_str(&format!("Import[{}]:\n", self.imports.len()));
            for (i, import) in self.imports.iter().enumerate() {
                result.push_str(&format!(" - global[{}] {}\n", i, import));
            }
        }
        if !self.globals.is_empty() {
            result.push_str(&format!("Global[{}]:\n", self.globals.len()));
            for (i, global) in self.globals.iter().enumerate() {
                result.push_str(&format!(
                    " - global[{}] {}\n",
                    self.imports.len() + i,
                    global
                ));
            }
        }
        if !self.exports.is_empty() {
            result.push_str(&format!("Export[{}]:\n", self.exports.len()));
            for export in &self.exports {
                result.push_str(&format!(" - {}\n", export));
            }
        }
        result
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Module name = {}", self.name)?;
        write!(f, " imports = ")?;
        f.debug_set().entries(self.imports.iter()).finish()?;
        write!(f, " globals = ")?;
        f.debug_set().entries(self.globals.iter()).finish()?;
        write!(f, " exports = ")?;
        f.debug_set().entries(self.exports.iter()).finish()
    }
}

#[derive(PartialEq, Eq, Clone, Copy, Debug, Hash)]
pub enum ValueType {
    I32,
    I64,
    F32,
    F64,
}

impl ValueType {
    pub fn decode(byte: u8) -> Result<Self, String> {
        match byte {
            0x7f => Ok(ValueType::I32),
            0x7e => Ok(ValueType::I64),
            0x7d => Ok(ValueType::F32),
            0x7c => Ok(ValueType::F64),
            _ => Err(format!("invalid value type: 0x{:02x}", byte)),
        }
    }

    pub fn wire_byte(&self) -> u8 {
        match self {
            ValueType::I32 => 0x7f,
            ValueType::I64 => 0x7e,
            ValueType::F32 => 0x7d,
            ValueType::F64 => 0x7c,
        }
    }

    /// Parses the text name of a value type (`"i32"`, `"f64"`, ...).
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "i32" => Some(ValueType::I32),
            "i64" => Some(ValueType::I64),
            "f32" => Some(ValueType::F32),
            "f64" => Some(ValueType::F64),
            _ => None,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                ValueType::I32 => "i32",
                ValueType::I64 => "i64",
                ValueType::F32 => "f32",
                ValueType::F64 => "f64",
            }
        )
    }
}

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct GlobalType {
    pub value_type: ValueType,
    pub mutable: bool, // const or var
}

impl GlobalType {
    pub fn new(value_type: ValueType, mutable: bool) -> Self {
        GlobalType { value_type, mutable }
    }
}

impl fmt::Display for GlobalType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} {}",
            self.value_type,
            if self.mutable { "var" } else { "const" }
        )
    }
}

/// A constant initializer expression. On the wire each is a single
/// instruction followed by `end`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConstExpr {
    I32Const(i32),
    I64Const(i64),
    F32Const(f32),
    F64Const(f64),
    GlobalGet(u32),
}

impl ConstExpr {
    pub fn opcode(&self) -> u8 {
        match self {
            ConstExpr::I32Const(_) => OP_I32_CONST,
            ConstExpr::I64Const(_) => OP_I64_CONST,
            ConstExpr::F32Const(_) => OP_F32_CONST,
            ConstExpr::F64Const(_) => OP_F64_CONST,
            ConstExpr::GlobalGet(_) => OP_GLOBAL_GET,
        }
    }
}

impl fmt::Display for ConstExpr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConstExpr::I32Const(v) => write!(f, "i32.const {}", v),
            ConstExpr::I64Const(v) => write!(f, "i64.const {}", v),
            ConstExpr::F32Const(v) => write!(f, "f32.const {}", v),
            ConstExpr::F64Const(v) => write!(f, "f64.const {}", v),
            ConstExpr::GlobalGet(idx) => write!(f, "global.get {}", idx),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Global {
    pub global_type: GlobalType,
    pub init: ConstExpr,
}

impl fmt::Display for Global {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} init = [{}]", self.global_type, self.init)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GlobalImport {
    pub module: String,
    pub name: String,
    pub global_type: GlobalType,
}

impl fmt::Display for GlobalImport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} <- {}.{}", self.global_type, self.module, self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Export {
    pub name: String,
    pub global_index: u32,
}

impl fmt::Display for Export {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "global[{}] -> \"{}\"", self.global_index, self.name)
    }
}
