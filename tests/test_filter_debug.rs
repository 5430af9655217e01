use chat_filter::filter::{Filter, message_typing_context};
use pretty_assertions::assert_eq;
use rstest::rstest;

#[rstest]
#[case("1 + 1", "BinaryOp[Plus](Val(1) : Int, Val(1) : Int)", "(1 + 1)")]
#[case(
    r##"author.color == "#ff0000""##,
    "BinaryOp[Eq](Val(author.color) : Color, Val(#ff0000) : String)",
    r##"(author.color == "#ff0000")"##
)]
#[case("1", "Val(1)", "1")]
#[case(r#""asd""#, "Val(asd)", r#""asd""#)]
#[case(r#"("asd")"#, "Val(asd)", r#""asd""#)]
#[case("author.subbed", "Val(author.subbed)", "author.subbed")]
#[case(
    "!author.subbed",
    "UnaryOp[Not](Val(author.subbed) : Bool)",
    "(!author.subbed)"
)]
#[case(
    r#"{"foo", "bar"} contains "foo""#,
    "BinaryOp[Contains](List(Val(foo) : String, Val(bar) : String) : StringList, Val(foo) : String)",
    r#"({"foo", "bar"} contains "foo")"#
)]
#[case(
    r#"!({"foo", "bar"} contains "foo")"#,
    "UnaryOp[Not](BinaryOp[Contains](List(Val(foo) : String, Val(bar) : String) : StringList, Val(foo) : String) : Bool)",
    r#"(!({"foo", "bar"} contains "foo"))"#
)]
#[case(
    r#"message.content match r"(\d\d)/(\d\d)/(\d\d\d\d)""#,
    r"BinaryOp[Match](Val(message.content) : String, RegEx((\d\d)/(\d\d)/(\d\d\d\d)) : RegularExpression)",
    r#"(message.content match r"(\d\d)/(\d\d)/(\d\d\d\d)")"#
)]
#[case(
    r#"message.content match ri"^hey""#,
    "BinaryOp[Match](Val(message.content) : String, RegEx(^hey) : RegularExpression)",
    r#"(message.content match ri"^hey")"#
)]
#[case(
    "1 + 2 * 3",
    "BinaryOp[Multiply](BinaryOp[Plus](Val(1) : Int, Val(2) : Int) : Int, Val(3) : Int)",
    "((1 + 2) * 3)"
)]
fn test_expression_debug(
    #[case] input: &str,
    #[case] debug_string: &str,
    #[case] filter_string: &str,
) {
    let filter = Filter::from_string(input)
        .unwrap_or_else(|err| panic!("Filter::from_string({input:?}) failed: {err}"));

    assert_eq!(
        filter.debug_string_with_context(message_typing_context()),
        debug_string,
        "debug string of {input}"
    );
    assert_eq!(filter.filter_string(), filter_string, "filter string of {input}");
}

/// Re-parsing the canonical source yields the same canonical source and type.
#[rstest]
#[case("1 + 1")]
#[case(r##"author.color == "#ff0000""##)]
#[case(r#"channel.name == "forsen" && author.badges contains "moderator""#)]
#[case(r#"!({"foo", "bar"} contains "foo")"#)]
#[case(r#"message.content match {r"(\d\d\d\d)\-(\d\d)", 2}"#)]
#[case(r#"message.content match ri"say \"hi\"""#)]
#[case("flags.reply || flags.first_message && !flags.automod")]
#[case("reward.cost * 2 - 10 >= 100")]
fn test_filter_string_round_trip(#[case] input: &str) {
    let first = Filter::from_string(input).expect("valid filter");
    let second = Filter::from_string(&first.filter_string()).expect("rendered filter is valid");

    assert_eq!(second.filter_string(), first.filter_string());
    assert_eq!(second.return_type(), first.return_type());
}
