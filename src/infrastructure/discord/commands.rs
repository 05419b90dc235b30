//! 斜杠命令定义与参数解析

use serenity::all::{
    CommandDataOption, CommandDataOptionValue, CommandOptionType, CreateCommand,
    CreateCommandOption,
};

use crate::domain::voice::KNOWN_VOICES;

/// 注册到 Discord 的全部命令
pub fn definitions() -> Vec<CreateCommand> {
    vec![
        CreateCommand::new("join")
            .description("ボイスチャンネルに参加します")
            .description_localized("en-US", "Join the voice channel")
            .description_localized("en-GB", "Join the voice channel")
            .dm_permission(false),
        CreateCommand::new("leave")
            .description("ボイスチャンネルから退出します")
            .description_localized("en-US", "Leave the voice channel")
            .dm_permission(false),
        CreateCommand::new("skip")
            .description("読み上げ中のメッセージをスキップします")
            .description_localized("en-US", "Skip the message being read")
            .dm_permission(false),
        dict_definition(),
        voice_definition(),
    ]
}

fn word_option() -> CreateCommandOption {
    CreateCommandOption::new(CommandOptionType::String, "word", "単語").required(true)
}

fn dict_definition() -> CreateCommand {
    CreateCommand::new("dict")
        .description("ユーザー辞書に関する操作を行います")
        .dm_permission(false)
        .add_option(
            CreateCommandOption::new(
                CommandOptionType::SubCommand,
                "put",
                "サーバーの辞書を追加・編集します",
            )
            .add_sub_option(word_option())
            .add_sub_option(
                CreateCommandOption::new(CommandOptionType::String, "read", "読み")
                    .required(true),
            ),
        )
        .add_option(
            CreateCommandOption::new(
                CommandOptionType::SubCommand,
                "delete",
                "サーバーの辞書を削除します",
            )
            .add_sub_option(word_option().set_autocomplete(true)),
        )
        .add_option(CreateCommandOption::new(
            CommandOptionType::SubCommand,
            "list",
            "サーバーの辞書の一覧をテキストファイルで送信します",
        ))
}

fn voice_definition() -> CreateCommand {
    let voice = KNOWN_VOICES.iter().fold(
        CreateCommandOption::new(CommandOptionType::String, "voice", "声"),
        |option, name| option.add_string_choice(*name, *name),
    );

    CreateCommand::new("voice")
        .description("自分の読み上げ設定を確認・変更します")
        .add_option(voice)
        .add_option(
            CreateCommandOption::new(CommandOptionType::Number, "pitch", "高さ (0.5 - 2.0)")
                .min_number_value(0.5)
                .max_number_value(2.0),
        )
        .add_option(
            CreateCommandOption::new(CommandOptionType::Number, "speed", "速さ (0.5 - 2.0)")
                .min_number_value(0.5)
                .max_number_value(2.0),
        )
}

/// 命令参数值
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Text(String),
    Number(f64),
}

/// 已解析的斜杠命令
#[derive(Debug, Clone, PartialEq)]
pub enum SlashCommand {
    Join,
    Leave,
    Skip,
    DictPut { word: String, reading: String },
    DictDelete { word: String },
    DictList,
    Voice {
        voice: Option<String>,
        pitch: Option<f32>,
        speed: Option<f32>,
    },
}

impl SlashCommand {
    /// 按命令名、子命令名和扁平化后的参数解析；未知命令或缺少必填参数时为 None
    pub fn parse(name: &str, subcommand: Option<&str>, args: &[(String, ArgValue)]) -> Option<Self> {
        match (name, subcommand) {
            ("join", _) => Some(Self::Join),
            ("leave", _) => Some(Self::Leave),
            ("skip", _) => Some(Self::Skip),
            ("dict", Some("put")) => Some(Self::DictPut {
                word: text_arg(args, "word")?,
                reading: text_arg(args, "read")?,
            }),
            ("dict", Some("delete")) => Some(Self::DictDelete {
                word: text_arg(args, "word")?,
            }),
            ("dict", Some("list")) => Some(Self::DictList),
            ("voice", _) => Some(Self::Voice {
                voice: text_arg(args, "voice"),
                pitch: number_arg(args, "pitch").map(|v| v as f32),
                speed: number_arg(args, "speed").map(|v| v as f32),
            }),
            _ => None,
        }
    }

    /// 需要频道内可见回复的命令；其余只回复给调用者
    pub fn is_public(&self) -> bool {
        matches!(self, Self::Join | Self::Leave | Self::DictPut { .. } | Self::DictDelete { .. } | Self::DictList)
    }
}

fn text_arg(args: &[(String, ArgValue)], key: &str) -> Option<String> {
    args.iter().find_map(|(name, value)| match value {
        ArgValue::Text(text) if name == key => Some(text.clone()),
        _ => None,
    })
}

fn number_arg(args: &[(String, ArgValue)], key: &str) -> Option<f64> {
    args.iter().find_map(|(name, value)| match value {
        ArgValue::Number(n) if name == key => Some(*n),
        _ => None,
    })
}

/// 把原始参数展开成（子命令名，参数表）
pub fn flatten_options(options: &[CommandDataOption]) -> (Option<String>, Vec<(String, ArgValue)>) {
    let mut subcommand = None;
    let mut args = Vec::new();
    collect_options(options, &mut subcommand, &mut args);
    (subcommand, args)
}

fn collect_options(
    options: &[CommandDataOption],
    subcommand: &mut Option<String>,
    args: &mut Vec<(String, ArgValue)>,
) {
    for option in options {
        match &option.value {
            CommandDataOptionValue::SubCommand(inner)
            | CommandDataOptionValue::SubCommandGroup(inner) => {
                *subcommand = Some(option.name.clone());
                collect_options(inner, subcommand, args);
            }
            CommandDataOptionValue::String(text) => {
                args.push((option.name.clone(), ArgValue::Text(text.clone())));
            }
            CommandDataOptionValue::Number(n) => {
                args.push((option.name.clone(), ArgValue::Number(*n)));
            }
            CommandDataOptionValue::Integer(n) => {
                args.push((option.name.clone(), ArgValue::Number(*n as f64)));
            }
            _ => {}
        }
    }
}
