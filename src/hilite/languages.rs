//! Built-in grammars
//!
//!     clike       base rules shared by the C family
//!     javascript  clike plus template strings (whose interpolations nest javascript again)
//!     python      standalone; f-string interpolations nest python
//!     java        clike plus text blocks, chars, annotations and generics
//!     c           clike without booleans, plus chars and preprocessor lines
//!     cpp         c plus raw strings and C++ keywords
//!
//! Patterns are written for the `regex` crate, which has neither lookaround nor
//! backreferences. Rules that only make sense with those (function names detected by a
//! following parenthesis, delimiter-matched strings) are either dropped or written out as
//! explicit alternatives.

use super::error::HiliteError;
use super::grammar::{Grammar, GrammarId, Pattern};
use super::registry::{GrammarRegistry, InsertTarget};
use tracing::debug;

/// Language aliases registered after the grammars
pub const ALIASES: &[(&str, &str)] = &[
    ("js", "javascript"),
    ("py", "python"),
    ("c++", "cpp"),
    ("h", "c"),
];

fn p(source: &str) -> Result<Pattern, HiliteError> {
    Pattern::new(source)
}

/// Register every built-in grammar and alias
pub fn register_builtins(registry: &mut GrammarRegistry) -> Result<(), HiliteError> {
    register_clike(registry)?;
    register_javascript(registry)?;
    register_python(registry)?;
    register_java(registry)?;
    register_c(registry)?;
    register_cpp(registry)?;

    for (alias, target) in ALIASES {
        registry.alias(alias, target)?;
    }
    debug!(languages = registry.list_languages().len(), "registered built-in languages");
    Ok(())
}

/// A grammar holding a single punctuation rule, for dotted names
fn punctuation(registry: &mut GrammarRegistry, source: &str) -> Result<GrammarId, HiliteError> {
    Ok(registry.add(Grammar::new().rule("punctuation", p(source)?)))
}

fn register_clike(registry: &mut GrammarRegistry) -> Result<(), HiliteError> {
    let class_inside = punctuation(registry, r"[.\\]")?;
    let clike = Grammar::new()
        .rule(
            "comment",
            vec![
                p(r"(^|[^\\])/\*[\s\S]*?(?:\*/|$)")?.lookbehind().greedy(),
                p(r"(^|[^\\:])//.*")?.lookbehind().greedy(),
            ],
        )
        .rule(
            "string",
            p(r#""(?:\\(?:\r\n|[\s\S])|[^"\\\r\n])*"|'(?:\\(?:\r\n|[\s\S])|[^'\\\r\n])*'"#)?.greedy(),
        )
        .rule(
            "class-name",
            p(r"(?i)(\b(?:class|extends|implements|instanceof|interface|new|trait)\s+|\bcatch\s+\()[\w.\\]+")?
                .lookbehind()
                .inside(class_inside),
        )
        .rule(
            "keyword",
            p(r"\b(?:break|catch|continue|do|else|finally|for|function|if|in|instanceof|new|null|return|throw|try|while)\b")?,
        )
        .rule("boolean", p(r"\b(?:false|true)\b")?)
        .rule(
            "number",
            p(r"(?i)\b0x[\da-f]+\b|(?:\b\d+(?:\.\d*)?|\B\.\d+)(?:e[+-]?\d+)?")?,
        )
        .rule("operator", p(r"[<>]=?|[!=]=?=?|--?|\+\+?|&&?|\|\|?|[?*/~^%]")?)
        .rule("punctuation", p(r"[{}\[\];(),.:]")?);
    registry.register("clike", clike);
    Ok(())
}

fn register_javascript(registry: &mut GrammarRegistry) -> Result<(), HiliteError> {
    let class_inside = punctuation(registry, r"[.\\]")?;
    let overrides = Grammar::new()
        .rule(
            "class-name",
            p(r"(\b(?:class|extends|implements|instanceof|interface|new)\s+)[\w.\\]+")?
                .lookbehind()
                .inside(class_inside),
        )
        .rule(
            "keyword",
            p(r"\b(?:as|async|await|break|case|catch|class|const|continue|debugger|default|delete|do|else|enum|export|extends|finally|for|from|function|get|if|implements|import|in|instanceof|interface|let|new|null|of|package|private|protected|public|return|set|static|super|switch|this|throw|try|typeof|undefined|var|void|while|with|yield)\b")?,
        )
        .rule(
            "number",
            p(r"(?i)\b0x[\da-f_]+n?\b|\b0b[01_]+n?\b|\b0o[0-7_]+n?\b|(?:\b\d[\d_]*(?:\.[\d_]*)?|\B\.\d[\d_]*)(?:e[+-]?\d+)?n?")?,
        )
        .rule(
            "operator",
            p(r"--|\+\+|\*\*=?|=>|&&=?|\|\|=?|[!=]==|<<=?|>>>?=?|[-+*/%&|^!=<>]=?|\.{3}|\?\?=?|\?\.?|[~:]")?,
        );
    let javascript = registry.derive("clike", overrides)?;
    registry.set_language("javascript", javascript);

    registry.insert_before(
        InsertTarget::Language("javascript"),
        "keyword",
        Grammar::new()
            .rule(
                "regex",
                p(r#"((?:^|[^$\w."'\])\s]|\b(?:return|yield))\s*)/(?:\[(?:[^\]\\\r\n]|\\.)*\]|\\.|[^/\\\[\r\n])+/[dgimyus]{0,7}"#)?
                    .lookbehind()
                    .greedy(),
            )
            .rule("constant", p(r"\b[A-Z](?:[A-Z_]|\dx?)*\b")?),
    )?;

    // `rest` points at the grammar being rebuilt; insert_before repoints it
    let interpolation = registry.add(
        Grammar::new()
            .rule(
                "interpolation-punctuation",
                p(r"^\$\{|\}$")?.alias("punctuation"),
            )
            .with_rest(registry.resolve("javascript")?),
    );
    let template = registry.add(
        Grammar::new()
            .rule("template-punctuation", p(r"^`|`$")?.alias("string"))
            .rule(
                "interpolation",
                p(r"((?:^|[^\\])(?:\\{2})*)\$\{(?:[^{}]|\{(?:[^{}]|\{[^}]*\})*\})+\}")?
                    .lookbehind()
                    .inside(interpolation),
            )
            .rule("string", p(r"[\s\S]+")?),
    );
    registry.insert_before(
        InsertTarget::Language("javascript"),
        "string",
        Grammar::new()
            .rule("hashbang", p(r"^#!.*")?.greedy().alias("comment"))
            .rule(
                "template-string",
                p(r"`(?:\\[\s\S]|\$\{(?:[^{}]|\{(?:[^{}]|\{[^}]*\})*\})+\}|[^\\`])*`")?
                    .greedy()
                    .inside(template),
            ),
    )?;
    Ok(())
}

fn register_python(registry: &mut GrammarRegistry) -> Result<(), HiliteError> {
    let python = registry.reserve();

    let interpolation = registry.add(Grammar::new().with_rest(python));
    let fstring = registry.add(
        Grammar::new()
            .rule(
                "interpolation",
                p(r"((?:^|[^{])(?:\{\{)*)\{[^{}](?:[^{}]|\{[^{}](?:[^{}]|\{[^{}]+\})*\})*\}")?
                    .lookbehind()
                    .inside(interpolation),
            )
            .rule("string", p(r"[\s\S]+")?),
    );
    let decorator_inside = punctuation(registry, r"\.")?;

    let grammar = Grammar::new()
        .rule("comment", p(r"(^|[^\\])#.*")?.lookbehind().greedy())
        .rule(
            "string-interpolation",
            p(r#"(?i)(?:f|fr|rf)(?:"""[\s\S]*?"""|'''[\s\S]*?'''|"(?:\\.|[^\\"\r\n])*"|'(?:\\.|[^\\'\r\n])*')"#)?
                .greedy()
                .inside(fstring),
        )
        .rule(
            "triple-quoted-string",
            p(r#"(?i)(?:[rub]|br|rb)?(?:"""[\s\S]*?"""|'''[\s\S]*?''')"#)?
                .greedy()
                .alias("string"),
        )
        .rule(
            "string",
            p(r#"(?i)(?:[rub]|br|rb)?(?:"(?:\\.|[^\\"\r\n])*"|'(?:\\.|[^\\'\r\n])*')"#)?.greedy(),
        )
        .rule("function", p(r"((?:^|\s)def[ \t]+)[a-zA-Z_]\w*")?.lookbehind())
        .rule("class-name", p(r"(?i)(\bclass\s+)\w+")?.lookbehind())
        .rule(
            "decorator",
            p(r"(?m)(^[\t ]*)@\w+(?:\.\w+)*")?
                .lookbehind()
                .aliases(["annotation", "punctuation"])
                .inside(decorator_inside),
        )
        .rule(
            "keyword",
            p(r"\b(?:and|as|assert|async|await|break|case|class|continue|def|del|elif|else|except|exec|finally|for|from|global|if|import|in|is|lambda|match|nonlocal|not|or|pass|print|raise|return|try|while|with|yield)\b")?,
        )
        .rule(
            "builtin",
            p(r"\b(?:__import__|abs|all|any|apply|ascii|basestring|bin|bool|buffer|bytearray|bytes|callable|chr|classmethod|cmp|coerce|compile|complex|delattr|dict|dir|divmod|enumerate|eval|execfile|file|filter|float|format|frozenset|getattr|globals|hasattr|hash|help|hex|id|input|int|intern|isinstance|issubclass|iter|len|list|locals|long|map|max|memoryview|min|next|object|oct|open|ord|pow|property|range|raw_input|reduce|reload|repr|reversed|round|set|setattr|slice|sorted|staticmethod|str|sum|super|tuple|type|unichr|unicode|vars|xrange|zip)\b")?,
        )
        .rule("boolean", p(r"\b(?:False|None|True)\b")?)
        .rule(
            "number",
            p(r"(?i)\b0(?:b(?:_?[01])+|o(?:_?[0-7])+|x(?:_?[a-f0-9])+)\b|(?:\b\d+(?:_\d+)*(?:\.(?:\d+(?:_\d+)*)?)?|\B\.\d+(?:_\d+)*)(?:e[+-]?\d+(?:_\d+)*)?j?")?,
        )
        .rule("operator", p(r"[-+%=]=?|!=|:=|\*\*?=?|//?=?|<[<=>]?|>[=>]?|[&|^~]")?)
        .rule("punctuation", p(r"[{}\[\];(),.:]")?);

    registry.define(python, grammar);
    registry.set_language("python", python);
    Ok(())
}

const JAVA_KEYWORDS: &str = r"\b(?:abstract|assert|boolean|break|byte|case|catch|char|class|const|continue|default|do|double|else|enum|exports|extends|final|finally|float|for|goto|if|implements|import|instanceof|int|interface|long|module|native|new|non-sealed|null|open|opens|package|permits|private|protected|provides|public|record|requires|return|sealed|short|static|strictfp|super|switch|synchronized|this|throw|throws|to|transient|transitive|try|uses|var|void|volatile|while|with|yield)\b";

fn register_java(registry: &mut GrammarRegistry) -> Result<(), HiliteError> {
    let class_inside = punctuation(registry, r"[.\\]")?;
    let overrides = Grammar::new()
        .rule(
            "string",
            p(r#"(^|[^\\])"(?:\\.|[^"\\\r\n])*""#)?.lookbehind().greedy(),
        )
        .rule(
            "class-name",
            p(r"(\b(?:class|enum|extends|implements|instanceof|interface|new|record|throws)\s+|\bcatch\s+\()[\w.\\]+")?
                .lookbehind()
                .inside(class_inside),
        )
        .rule("keyword", p(JAVA_KEYWORDS)?)
        .rule(
            "number",
            p(r"(?i)\b0b[01][01_]*L?\b|\b0x(?:\.[\da-f_p+-]+|[\da-f_]+(?:\.[\da-f_p+-]+)?)\b|(?:\b\d[\d_]*(?:\.[\d_]*)?|\B\.\d[\d_]*)(?:e[+-]?\d[\d_]*)?[dfl]?")?,
        )
        .rule(
            "operator",
            p(r"(?m)(^|[^.])(?:<<=?|>>>?=?|->|--|\+\+|&&|\|\||::|[?:~]|[-+*/%&|^!=<>]=?)")?.lookbehind(),
        )
        .rule("constant", p(r"\b[A-Z][A-Z_\d]+\b")?);
    let java = registry.derive("clike", overrides)?;
    registry.set_language("java", java);

    registry.insert_before(
        InsertTarget::Language("java"),
        "string",
        Grammar::new()
            .rule(
                "triple-quoted-string",
                p(r#""""[ \t]*[\r\n](?:(?:"|"")?(?:\\.|[^"\\]))*""""#)?
                    .greedy()
                    .alias("string"),
            )
            .rule("char", p(r"'(?:\\.|[^'\\\r\n]){1,6}'")?.greedy()),
    )?;

    let generics = registry.add(
        Grammar::new()
            .rule("class-name", p(r"\b[A-Z]\w*\b")?)
            .rule("keyword", p(JAVA_KEYWORDS)?)
            .rule("punctuation", p(r"[<>(),.:]")?)
            .rule("operator", p(r"[?&|]")?),
    );
    registry.insert_before(
        InsertTarget::Language("java"),
        "class-name",
        Grammar::new()
            .rule(
                "annotation",
                p(r"(^|[^.])@\w+(?:\s*\.\s*\w+)*")?
                    .lookbehind()
                    .alias("punctuation"),
            )
            .rule(
                "generics",
                p(r"<(?:[\w\s,.?]|&[\w\s,.?]|<(?:[\w\s,.?]|&[\w\s,.?]|<(?:[\w\s,.?]|&[\w\s,.?]|<(?:[\w\s,.?]|&[\w\s,.?])*>)*>)*>)*>")?
                    .inside(generics),
            ),
    )?;
    Ok(())
}

fn c_comment() -> Result<Pattern, HiliteError> {
    Ok(p(r"//(?:[^\r\n\\]|\\(?:\r\n?|\n)?)*|/\*[\s\S]*?(?:\*/|$)")?.greedy())
}

fn c_string() -> Result<Pattern, HiliteError> {
    Ok(p(r#""(?:\\(?:\r\n|[\s\S])|[^"\\\r\n])*""#)?.greedy())
}

fn c_char() -> Result<Pattern, HiliteError> {
    Ok(p(r"'(?:\\(?:\r\n|[\s\S])|[^'\\\r\n]){0,32}'")?.greedy())
}

fn register_c(registry: &mut GrammarRegistry) -> Result<(), HiliteError> {
    let overrides = Grammar::new()
        .rule("comment", c_comment()?)
        .rule("string", c_string()?)
        .rule(
            "class-name",
            p(r"(\b(?:enum|struct)\s+(?:__attribute__\s*\(\([\s\S]*?\)\)\s*)?)\w+|\b[a-z]\w*_t\b")?.lookbehind(),
        )
        .rule(
            "keyword",
            p(r"\b(?:_Alignas|_Alignof|_Atomic|_Bool|_Complex|_Generic|_Imaginary|_Noreturn|_Static_assert|_Thread_local|__attribute__|asm|auto|break|case|char|const|continue|default|do|double|else|enum|extern|float|for|goto|if|inline|int|long|register|return|short|signed|sizeof|static|struct|switch|typedef|typeof|union|unsigned|void|volatile|while)\b")?,
        )
        .rule(
            "number",
            p(r"(?i)(?:\b0x(?:[\da-f]+(?:\.[\da-f]*)?|\.[\da-f]+)(?:p[+-]?\d+)?|(?:\b\d+(?:\.\d*)?|\B\.\d+)(?:e[+-]?\d+)?)[ful]{0,4}")?,
        )
        .rule(
            "operator",
            p(r">>=?|<<=?|->|--|\+\+|&&|\|\||::|[?:~]|[-+*/%&|^!=<>]=?")?,
        );
    let c = registry.derive("clike", overrides)?;
    registry.set_language("c", c);

    registry.insert_before(
        InsertTarget::Language("c"),
        "string",
        Grammar::new().rule("char", c_char()?),
    )?;

    // Macro expressions are C again; insert_before repoints this to the rebuilt grammar
    let current = registry.resolve("c")?;
    let macro_inside = registry.add(
        Grammar::new()
            .rule(
                "string",
                vec![p(r"^(#\s*include\s*)<[^>]+>")?.lookbehind(), c_string()?],
            )
            .rule("char", c_char()?)
            .rule("comment", c_comment()?)
            .rule("macro-name", p(r"(?i)(^#\s*define\s+)\w+\b")?.lookbehind())
            .rule(
                "directive",
                p(r"(?i)^(#\s*)[a-z]+")?.lookbehind().alias("keyword"),
            )
            .rule("directive-hash", p(r"^#")?)
            .rule("punctuation", p(r"##")?)
            .rule("expression", p(r"\S[\s\S]*")?.inside(current)),
    );
    registry.insert_before(
        InsertTarget::Language("c"),
        "string",
        Grammar::new().rule(
            "macro",
            p(r"(?im)(^[\t ]*)#\s*[a-z](?:[^\r\n\\/]|/\*(?:[^*]|\*+[^*/])*\*+/|/[^*\r\n]?|\\(?:\r\n|[\s\S]))*")?
                .lookbehind()
                .greedy()
                .alias("property")
                .inside(macro_inside),
        ),
    )?;

    registry.insert_before(
        InsertTarget::Language("c"),
        "number",
        Grammar::new().rule(
            "constant",
            p(r"\b(?:EOF|NULL|SEEK_CUR|SEEK_END|SEEK_SET|__DATE__|__FILE__|__LINE__|__TIMESTAMP__|__TIME__|__func__|stderr|stdin|stdout)\b")?,
        ),
    )?;

    let c = registry.resolve("c")?;
    if let Some(grammar) = registry.get_mut(c) {
        grammar.remove("boolean");
    }
    Ok(())
}

fn register_cpp(registry: &mut GrammarRegistry) -> Result<(), HiliteError> {
    let overrides = Grammar::new()
        .rule(
            "class-name",
            p(r"(\b(?:class|concept|enum|struct|typename)\s+)\w+")?.lookbehind(),
        )
        .rule(
            "keyword",
            p(r"\b(?:alignas|alignof|asm|auto|bool|break|case|catch|char|char16_t|char32_t|char8_t|class|co_await|co_return|co_yield|compl|concept|const|const_cast|consteval|constexpr|constinit|continue|decltype|default|delete|do|double|dynamic_cast|else|enum|explicit|export|extern|final|float|for|friend|goto|if|import|inline|int|int16_t|int32_t|int64_t|int8_t|long|module|mutable|namespace|new|noexcept|nullptr|operator|override|private|protected|public|register|reinterpret_cast|requires|return|short|signed|sizeof|static|static_assert|static_cast|struct|switch|template|this|thread_local|throw|try|typedef|typeid|typename|uint16_t|uint32_t|uint64_t|uint8_t|union|unsigned|using|virtual|void|volatile|wchar_t|while)\b")?,
        )
        .rule(
            "number",
            p(r"(?i)(?:\b0b[01']+|\b0x(?:[\da-f']+(?:\.[\da-f']*)?|\.[\da-f']+)(?:p[+-]?[\d']+)?|(?:\b[\d']+(?:\.[\d']*)?|\B\.[\d']+)(?:e[+-]?[\d']+)?)[ful]{0,4}")?
                .greedy(),
        )
        .rule(
            "operator",
            p(r">>=?|<<=?|->|--|\+\+|&&|\|\||[?:~]|<=>|[-+*/%&|^!=<>]=?|\b(?:and|and_eq|bitand|bitor|not|not_eq|or|or_eq|xor|xor_eq)\b")?,
        )
        .rule("boolean", p(r"\b(?:false|true)\b")?);
    let cpp = registry.derive("c", overrides)?;
    registry.set_language("cpp", cpp);

    registry.insert_before(
        InsertTarget::Language("cpp"),
        "string",
        Grammar::new().rule(
            "raw-string",
            p(r#"R"\([\s\S]*?\)"|R"([^()\\ ]{1,16})\([\s\S]*?\)[^()\\ ]{1,16}""#)?
                .greedy()
                .alias("string"),
        ),
    )?;
    registry.insert_before(
        InsertTarget::Language("cpp"),
        "operator",
        Grammar::new().rule("double-colon", p(r"::")?.alias("punctuation")),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hilite::token::{flatten_text, Node, Token};
    use crate::hilite::tokenizer::tokenize;

    fn registry() -> GrammarRegistry {
        GrammarRegistry::with_defaults().unwrap()
    }

    fn names(registry: &GrammarRegistry, language: &str) -> Vec<String> {
        let id = registry.resolve(language).unwrap();
        registry
            .get(id)
            .unwrap()
            .names()
            .into_iter()
            .map(String::from)
            .collect()
    }

    fn run(registry: &GrammarRegistry, language: &str, text: &str) -> Vec<Node> {
        let id = registry.resolve(language).unwrap();
        let nodes = tokenize(text, registry, id).unwrap();
        assert_eq!(flatten_text(&nodes), text);
        nodes
    }

    fn tok(kind: &str, text: &str) -> Node {
        Node::Token(Token::text(kind, text))
    }

    #[test]
    fn test_builtins_and_aliases_resolve() {
        let registry = registry();
        for language in ["clike", "javascript", "python", "java", "c", "cpp", "plain"] {
            assert!(registry.has(language), "{} missing", language);
        }
        for (alias, target) in ALIASES {
            assert_eq!(registry.language(alias), registry.language(target));
        }
    }

    #[test]
    fn test_javascript_rule_order() {
        assert_eq!(
            names(&registry(), "javascript"),
            vec![
                "comment",
                "hashbang",
                "template-string",
                "string",
                "class-name",
                "regex",
                "constant",
                "keyword",
                "boolean",
                "number",
                "operator",
                "punctuation",
            ]
        );
    }

    #[test]
    fn test_c_rule_order_has_no_boolean() {
        assert_eq!(
            names(&registry(), "c"),
            vec![
                "comment",
                "char",
                "macro",
                "string",
                "class-name",
                "keyword",
                "constant",
                "number",
                "operator",
                "punctuation",
            ]
        );
    }

    #[test]
    fn test_clike_untouched_by_derivations() {
        assert_eq!(
            names(&registry(), "clike"),
            vec![
                "comment",
                "string",
                "class-name",
                "keyword",
                "boolean",
                "number",
                "operator",
                "punctuation",
            ]
        );
    }

    #[test]
    fn test_python_keywords_and_numbers() {
        let registry = registry();
        assert_eq!(
            run(&registry, "py", "x = 42"),
            vec![
                Node::from("x "),
                tok("operator", "="),
                Node::from(" "),
                tok("number", "42"),
            ]
        );
    }

    #[test]
    fn test_comment_wins_over_string() {
        let registry = registry();
        assert_eq!(
            run(&registry, "javascript", "// \"not a string\""),
            vec![tok("comment", "// \"not a string\"")]
        );
    }

    #[test]
    fn test_template_interpolation_nests_javascript() {
        let registry = registry();
        let nodes = run(&registry, "js", "`a${1}`");
        assert_eq!(nodes.len(), 1);
        let template = nodes[0].as_token().unwrap();
        assert!(template.is("template-string"));

        let parts = template.children().unwrap();
        let interpolation = parts
            .iter()
            .filter_map(Node::as_token)
            .find(|t| t.is("interpolation"))
            .unwrap();
        let inner = interpolation.children().unwrap();
        assert!(inner
            .iter()
            .filter_map(Node::as_token)
            .any(|t| t.is("number") && t.content_text() == "1"));
    }

    #[test]
    fn test_macro_expression_nests_c() {
        let registry = registry();
        let nodes = run(&registry, "c", "#define N 10\n");
        let macro_token = nodes[0].as_token().unwrap();
        assert!(macro_token.is("macro"));
        assert_eq!(macro_token.alias, vec!["property"]);
        let parts = macro_token.children().unwrap();
        assert_eq!(parts[0], tok("directive-hash", "#"));
        assert_eq!(
            parts[1],
            Node::Token(Token::new(
                "directive",
                crate::hilite::token::Content::Text("define".to_string()),
                vec!["keyword".to_string()],
                6
            ))
        );
    }
}
