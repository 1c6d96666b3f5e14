//! The tokens emitted by the lexer.

use bitflags::bitflags;
use span::{Span, Spanning};
use std::fmt;

/// A token.
///
/// Once produced, neither its span nor its value ever change.
#[derive(Clone, PartialEq, Debug)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    /// The source text of identifiers and literals, empty otherwise.
    pub text: String,
    pub literal: Option<Literal>,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span, text: String::new(), literal: None }
    }

    pub fn identifier(span: Span, name: impl Into<String>) -> Self {
        Self { text: name.into(), ..Self::new(TokenKind::Identifier, span) }
    }

    pub fn literal(span: Span, text: impl Into<String>, literal: Literal) -> Self {
        Self { text: text.into(), literal: Some(literal), ..Self::new(TokenKind::Literal, span) }
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }
}

impl Spanning for Token {
    fn span(&self) -> Span {
        self.span
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Identifier => write!(f, "identifier ‘{}’", self.text),
            TokenKind::Literal => write!(f, "literal ‘{}’", self.text),
            kind => write!(f, "{kind}"),
        }
    }
}

macro_rules! token_kinds {
    (
        special { $( $( #[$special_doc:meta] )* $special:ident => $special_name:literal, )* }
        keywords { $( $keyword:ident => $keyword_text:literal, )* }
        symbols { $( $symbol:ident => $symbol_text:literal, )* }
    ) => {
        /// The kind of a token.
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
        pub enum TokenKind {
            $( $( #[$special_doc] )* $special, )*
            $( $keyword, )*
            $( $symbol, )*
        }

        impl TokenKind {
            /// Look up the keyword spelled by the given identifier.
            pub fn keyword(text: &str) -> Option<Self> {
                Some(match text {
                    $( $keyword_text => Self::$keyword, )*
                    _ => return None,
                })
            }

            /// The source representation of keywords and symbols or a description otherwise.
            pub const fn text(self) -> &'static str {
                match self {
                    $( Self::$special => $special_name, )*
                    $( Self::$keyword => $keyword_text, )*
                    $( Self::$symbol => $symbol_text, )*
                }
            }

            pub const fn is_keyword(self) -> bool {
                matches!(self, $( Self::$keyword )|*)
            }

            pub const fn is_symbol(self) -> bool {
                matches!(self, $( Self::$symbol )|*)
            }
        }
    };
}

token_kinds! {
    special {
        /// A character sequence the lexer could not make sense of.
        Invalid => "invalid token",
        EndOfFile => "end of input",
        Identifier => "identifier",
        /// Numeric, string and character literals; see [`Literal`].
        Literal => "literal",
    }
    keywords {
        Abstract => "abstract",
        Alias => "alias",
        Align => "align",
        Asm => "asm",
        Assert => "assert",
        Auto => "auto",
        Body => "body",
        Bool => "bool",
        Break => "break",
        Byte => "byte",
        Case => "case",
        Cast => "cast",
        Catch => "catch",
        Cdouble => "cdouble",
        Cent => "cent",
        Cfloat => "cfloat",
        Char => "char",
        Class => "class",
        Const => "const",
        Continue => "continue",
        Creal => "creal",
        Dchar => "dchar",
        Debug => "debug",
        Default => "default",
        Delegate => "delegate",
        Delete => "delete",
        Deprecated => "deprecated",
        Do => "do",
        Double => "double",
        Else => "else",
        Enum => "enum",
        Export => "export",
        Extern => "extern",
        False => "false",
        Final => "final",
        Finally => "finally",
        Float => "float",
        For => "for",
        Foreach => "foreach",
        ForeachReverse => "foreach_reverse",
        Function => "function",
        Goto => "goto",
        Idouble => "idouble",
        If => "if",
        Ifloat => "ifloat",
        Immutable => "immutable",
        Import => "import",
        In => "in",
        Inout => "inout",
        Int => "int",
        Interface => "interface",
        Invariant => "invariant",
        Ireal => "ireal",
        Is => "is",
        Lazy => "lazy",
        Long => "long",
        Macro => "macro",
        Mixin => "mixin",
        Module => "module",
        New => "new",
        Nothrow => "nothrow",
        Null => "null",
        Out => "out",
        Override => "override",
        Package => "package",
        Pragma => "pragma",
        Private => "private",
        Protected => "protected",
        Public => "public",
        Pure => "pure",
        Real => "real",
        Ref => "ref",
        Return => "return",
        Scope => "scope",
        Shared => "shared",
        Short => "short",
        Static => "static",
        Struct => "struct",
        Super => "super",
        Switch => "switch",
        Synchronized => "synchronized",
        Template => "template",
        This => "this",
        Throw => "throw",
        True => "true",
        Try => "try",
        Typedef => "typedef",
        Typeid => "typeid",
        Typeof => "typeof",
        Ubyte => "ubyte",
        Ucent => "ucent",
        Uint => "uint",
        Ulong => "ulong",
        Union => "union",
        Unittest => "unittest",
        Ushort => "ushort",
        Version => "version",
        Void => "void",
        Volatile => "volatile",
        Wchar => "wchar",
        While => "while",
        With => "with",
        Gshared => "__gshared",
        Traits => "__traits",
        Vector => "__vector",
        Parameters => "__parameters",
        SpecialFile => "__FILE__",
        SpecialFileFullPath => "__FILE_FULL_PATH__",
        SpecialModule => "__MODULE__",
        SpecialLine => "__LINE__",
        SpecialFunction => "__FUNCTION__",
        SpecialPrettyFunction => "__PRETTY_FUNCTION__",
        SpecialDate => "__DATE__",
        SpecialTime => "__TIME__",
        SpecialTimestamp => "__TIMESTAMP__",
        SpecialVendor => "__VENDOR__",
        SpecialVersion => "__VERSION__",
        SpecialEndOfFile => "__EOF__",
    }
    symbols {
        Ampersand => "&",
        AmpersandEquals => "&=",
        Asterisk => "*",
        AsteriskEquals => "*=",
        At => "@",
        Bar => "|",
        BarEquals => "|=",
        Caret => "^",
        CaretEquals => "^=",
        ClosingCurlyBracket => "}",
        ClosingRoundBracket => ")",
        ClosingSquareBracket => "]",
        Colon => ":",
        Comma => ",",
        Dollar => "$",
        Dot => ".",
        DoubleAmpersand => "&&",
        DoubleBar => "||",
        DoubleCaret => "^^",
        DoubleCaretEquals => "^^=",
        DoubleDot => "..",
        DoubleEquals => "==",
        DoubleMinus => "--",
        DoublePlus => "++",
        Equals => "=",
        Exclamation => "!",
        GreaterThan => ">",
        GreaterThanOrEqual => ">=",
        Hash => "#",
        LessThan => "<",
        LessThanOrEqual => "<=",
        Minus => "-",
        MinusEquals => "-=",
        NotEquals => "!=",
        OpeningCurlyBracket => "{",
        OpeningRoundBracket => "(",
        OpeningSquareBracket => "[",
        Percent => "%",
        PercentEquals => "%=",
        Plus => "+",
        PlusEquals => "+=",
        QuestionMark => "?",
        Semicolon => ";",
        ShiftLeft => "<<",
        ShiftLeftEquals => "<<=",
        ShiftRight => ">>",
        ShiftRightEquals => ">>=",
        Slash => "/",
        SlashEquals => "/=",
        Tilde => "~",
        TildeEquals => "~=",
        TripleDot => "...",
        UnsignedShiftRight => ">>>",
        UnsignedShiftRightEquals => ">>>=",
        WideArrowRight => "=>",
    }
}

use TokenKind::*;

impl TokenKind {
    /// Built-in types like `int` or `void`.
    pub const fn is_basic_type(self) -> bool {
        matches!(
            self,
            Bool | Byte
                | Ubyte
                | Short
                | Ushort
                | Int
                | Uint
                | Long
                | Ulong
                | Cent
                | Ucent
                | Char
                | Wchar
                | Dchar
                | Float
                | Double
                | Real
                | Ifloat
                | Idouble
                | Ireal
                | Cfloat
                | Cdouble
                | Creal
                | Void
        )
    }

    pub const fn is_integral_type(self) -> bool {
        matches!(
            self,
            Bool | Byte
                | Ubyte
                | Short
                | Ushort
                | Int
                | Uint
                | Long
                | Ulong
                | Cent
                | Ucent
                | Char
                | Wchar
                | Dchar
        )
    }

    pub const fn is_floating_point_type(self) -> bool {
        matches!(
            self,
            Float | Double | Real | Ifloat | Idouble | Ireal | Cfloat | Cdouble | Creal
        )
    }

    pub const fn is_unsigned_type(self) -> bool {
        matches!(self, Bool | Ubyte | Ushort | Uint | Ulong | Ucent | Char | Wchar | Dchar)
    }

    /// The size in bytes of a basic type.
    pub const fn basic_type_size(self) -> Option<u8> {
        Some(match self {
            Void | Bool | Byte | Ubyte | Char => 1,
            Short | Ushort | Wchar => 2,
            Int | Uint | Dchar | Float | Ifloat => 4,
            Long | Ulong | Double | Idouble | Cfloat => 8,
            Cent | Ucent | Cdouble => 16,
            Real | Ireal => 10,
            Creal => 20,
            _ => return None,
        })
    }

    /// Type constructors that may wrap a type in parentheses: `const(int)`.
    pub const fn is_type_qualifier(self) -> bool {
        matches!(self, Const | Immutable | Shared | Inout | Scope)
    }

    pub const fn is_storage_class(self) -> bool {
        matches!(
            self,
            Abstract
                | Auto
                | Const
                | Deprecated
                | Extern
                | Final
                | Immutable
                | Inout
                | Shared
                | Nothrow
                | Override
                | Pure
                | Scope
                | Static
                | Synchronized
                | Ref
                | Gshared
        )
    }

    pub const fn is_visibility(self) -> bool {
        matches!(self, Public | Private | Protected | Package | Export)
    }

    /// Tokens that may start an attribute of a declaration.
    pub const fn is_attribute(self) -> bool {
        self.is_storage_class()
            || self.is_visibility()
            || matches!(self, Align | Pragma | At | Static | Debug | Version)
    }

    /// Attributes allowed after the parameter list of a function.
    pub const fn is_member_function_attribute(self) -> bool {
        matches!(
            self,
            Const | Immutable | Shared | Inout | Pure | Nothrow | Ref | Return | Scope | At
        )
    }

    pub const fn is_parameter_attribute(self) -> bool {
        matches!(
            self,
            In | Out | Inout | Ref | Lazy | Scope | Const | Immutable | Shared | Return | Final | Auto
        )
    }

    pub const fn is_assign_operator(self) -> bool {
        matches!(
            self,
            Equals
                | PlusEquals
                | MinusEquals
                | AsteriskEquals
                | SlashEquals
                | PercentEquals
                | AmpersandEquals
                | BarEquals
                | CaretEquals
                | TildeEquals
                | ShiftLeftEquals
                | ShiftRightEquals
                | UnsignedShiftRightEquals
                | DoubleCaretEquals
        )
    }

    /// Keywords which expand to a literal like `__LINE__`.
    pub const fn is_special_token(self) -> bool {
        matches!(
            self,
            SpecialFile
                | SpecialFileFullPath
                | SpecialModule
                | SpecialLine
                | SpecialFunction
                | SpecialPrettyFunction
                | SpecialDate
                | SpecialTime
                | SpecialTimestamp
                | SpecialVendor
                | SpecialVersion
        )
    }

    pub const fn is_closing_bracket(self) -> bool {
        matches!(self, ClosingCurlyBracket | ClosingRoundBracket | ClosingSquareBracket)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invalid | Self::EndOfFile | Self::Identifier | Self::Literal => {
                f.write_str(self.text())
            }
            _ => write!(f, "‘{}’", self.text()),
        }
    }
}

/// The shape of a literal.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LiteralFormat {
    Scalar,
    FloatingPoint,
    /// A string literal whose escape sequences got decoded.
    String,
    /// A string literal taken verbatim: `r"…"`, `` `…` ``, `q"…"`, `q{…}` and `x"…"`.
    VerbatimString,
    Char,
}

bitflags! {
    /// Refinements of the literal format stemming from suffixes.
    #[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
    pub struct LiteralSubformat: u16 {
        const UNSIGNED = 1;
        const LONG = 1 << 1;
        const DOUBLE = 1 << 2;
        const FLOAT = 1 << 3;
        const REAL = 1 << 4;
        const IMAGINARY = 1 << 5;
        const UTF8 = 1 << 6;
        const UTF16 = 1 << 7;
        const UTF32 = 1 << 8;
    }
}

/// The decoded value of a literal.
#[derive(Clone, PartialEq, Debug)]
pub enum LiteralValue {
    Integer(u64),
    Float(f64),
    Text(String),
    Char(char),
}

#[derive(Clone, PartialEq, Debug)]
pub struct Literal {
    pub format: LiteralFormat,
    pub subformat: LiteralSubformat,
    pub value: LiteralValue,
}

impl Literal {
    pub fn new(format: LiteralFormat, subformat: LiteralSubformat, value: LiteralValue) -> Self {
        Self { format, subformat, value }
    }

    pub fn is_string(&self) -> bool {
        matches!(self.format, LiteralFormat::String | LiteralFormat::VerbatimString)
    }

    /// The basic type a literal has without any context.
    pub fn basic_type(&self) -> TokenKind {
        let subformat = self.subformat;
        match self.format {
            LiteralFormat::Scalar if subformat.contains(LiteralSubformat::IMAGINARY) => Idouble,
            LiteralFormat::Scalar => match (
                subformat.contains(LiteralSubformat::UNSIGNED),
                subformat.contains(LiteralSubformat::LONG),
            ) {
                (false, false) => match self.value {
                    LiteralValue::Integer(value) if value > i32::MAX as u64 => Long,
                    _ => Int,
                },
                (true, false) => match self.value {
                    LiteralValue::Integer(value) if value > u64::from(u32::MAX) => Ulong,
                    _ => Uint,
                },
                (false, true) => Long,
                (true, true) => Ulong,
            },
            LiteralFormat::FloatingPoint => {
                let imaginary = subformat.contains(LiteralSubformat::IMAGINARY);
                if subformat.contains(LiteralSubformat::FLOAT) {
                    if imaginary { Ifloat } else { Float }
                } else if subformat.contains(LiteralSubformat::REAL) {
                    if imaginary { Ireal } else { Real }
                } else if imaginary {
                    Idouble
                } else {
                    Double
                }
            }
            LiteralFormat::Char => match self.value {
                LiteralValue::Char(character) if u32::from(character) > 0xFFFF => Dchar,
                LiteralValue::Char(character) if u32::from(character) > 0xFF => Wchar,
                _ => Char,
            },
            LiteralFormat::String | LiteralFormat::VerbatimString => {
                if subformat.contains(LiteralSubformat::UTF32) {
                    Dchar
                } else if subformat.contains(LiteralSubformat::UTF16) {
                    Wchar
                } else {
                    Char
                }
            }
        }
    }
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value:?}"),
            Self::Text(text) => write!(f, "{text:?}"),
            Self::Char(character) => write!(f, "{character:?}"),
        }
    }
}
