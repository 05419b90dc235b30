//! Discord 事件处理器
//!
//! 把 serenity 的网关事件转换成应用层的命令 / 查询，
//! 并维护成员目录和语音状态缓存

use std::sync::{Arc, OnceLock};

use serenity::all::{
    Command, CommandInteraction, Context, CreateAttachment, CreateAutocompleteResponse,
    CreateInteractionResponse, EditInteractionResponse, EventHandler, Guild, GuildChannel,
    GuildMemberUpdateEvent, Interaction, Member, Message, Ready, UnavailableGuild, User,
    VoiceState,
};

use super::commands::{definitions, flatten_options, SlashCommand};
use super::replies;
use crate::application::{
    ApplicationError, DeleteWord, DeleteWordHandler, DirectoryPort, GetVoicePreference,
    GetVoicePreferenceHandler, JoinVoice, JoinVoiceHandler, LeaveVoice, LeaveVoiceHandler,
    ListWords, ListWordsHandler, PutWord, PutWordHandler, SessionRegistryPort,
    SetVoicePreference, SetVoicePreferenceHandler, SkipSpeech, SkipSpeechHandler, SpeakMessage,
    SpeakMessageHandler, SpeakOutcome, SuggestWords, SuggestWordsHandler, MAX_SUGGESTIONS,
};
use crate::domain::announcement::{MemberProfile, VoicePresence};
use crate::domain::{ChannelId, GuildId, UserId};
use crate::infrastructure::memory::{InMemoryDirectory, VoiceStateTracker};

/// 事件处理器用到的全部服务，由 main 组装
pub struct BotServices {
    pub registry: Arc<dyn SessionRegistryPort>,
    pub directory: Arc<InMemoryDirectory>,
    pub tracker: Arc<VoiceStateTracker>,
    pub join: JoinVoiceHandler,
    pub leave: LeaveVoiceHandler,
    pub skip: SkipSpeechHandler,
    pub speak: SpeakMessageHandler,
    pub put_word: PutWordHandler,
    pub delete_word: DeleteWordHandler,
    pub list_words: ListWordsHandler,
    pub suggest_words: SuggestWordsHandler,
    pub set_preference: SetVoicePreferenceHandler,
    pub get_preference: GetVoicePreferenceHandler,
}

pub struct DiscordHandler {
    services: Arc<BotServices>,
    /// Bot 自己的账号，ready 事件里写入
    self_user_id: OnceLock<UserId>,
    /// 设置后只在该服务器注册命令
    command_guild_id: Option<u64>,
}

impl DiscordHandler {
    pub fn new(services: Arc<BotServices>, command_guild_id: Option<u64>) -> Self {
        Self {
            services,
            self_user_id: OnceLock::new(),
            command_guild_id,
        }
    }

    async fn register_commands(&self, ctx: &Context) {
        let commands = definitions();
        let count = commands.len();
        let result = match self.command_guild_id {
            Some(id) => serenity::all::GuildId::new(id)
                .set_commands(&ctx.http, commands)
                .await
                .map(|_| ()),
            None => Command::set_global_commands(&ctx.http, commands)
                .await
                .map(|_| ()),
        };
        match result {
            Ok(()) => tracing::info!(
                count,
                guild_id = ?self.command_guild_id,
                "Slash commands registered"
            ),
            Err(e) => tracing::error!(error = %e, "Failed to register slash commands"),
        }
    }

    async fn handle_command(&self, ctx: &Context, cmd: &CommandInteraction) {
        let (subcommand, args) = flatten_options(&cmd.data.options);
        let Some(command) = SlashCommand::parse(&cmd.data.name, subcommand.as_deref(), &args)
        else {
            tracing::warn!(name = %cmd.data.name, "Unknown slash command");
            return;
        };

        let deferred = if command.is_public() {
            cmd.defer(&ctx.http).await
        } else {
            cmd.defer_ephemeral(&ctx.http).await
        };
        if let Err(e) = deferred {
            tracing::warn!(name = %cmd.data.name, error = %e, "Failed to defer interaction");
            return;
        }

        let user_id = user_id(cmd.user.id);
        let response = match (command, cmd.guild_id.map(guild_id)) {
            (SlashCommand::Voice { voice, pitch, speed }, _) => {
                self.voice(user_id, voice, pitch, speed).await
            }
            (_, None) => Ok(replies::guild_only().edit()),
            (command, Some(guild_id)) => {
                self.guild_command(ctx, cmd, command, guild_id, user_id).await
            }
        };

        let response = response.unwrap_or_else(|e| {
            tracing::info!(name = %cmd.data.name, user_id = %user_id, error = %e, "Command failed");
            replies::error(&e).edit()
        });
        self.respond(ctx, cmd, response).await;
    }

    async fn guild_command(
        &self,
        ctx: &Context,
        cmd: &CommandInteraction,
        command: SlashCommand,
        guild_id: GuildId,
        user_id: UserId,
    ) -> Result<EditInteractionResponse, ApplicationError> {
        let services = &self.services;
        match command {
            SlashCommand::Join => {
                let self_user_id = self
                    .self_user_id
                    .get()
                    .copied()
                    .ok_or_else(|| ApplicationError::internal("Gateway identity not known yet"))?;
                let invoker_voice_channel = services.tracker.channel_of(guild_id, user_id);

                if invoker_voice_channel.is_some() && services.registry.get(guild_id).is_none() {
                    self.respond(ctx, cmd, replies::connecting().edit()).await;
                }

                let joined = services
                    .join
                    .handle(JoinVoice {
                        guild_id,
                        invoker_voice_channel,
                        text_channel_id: channel_id(cmd.channel_id),
                        self_user_id,
                    })
                    .await?;
                tracing::info!(
                    session_id = %joined.session_id,
                    guild_id = %guild_id,
                    channel_id = %joined.voice_channel_id,
                    "Joined voice channel"
                );
                Ok(replies::connected().edit())
            }
            SlashCommand::Leave => {
                services.leave.handle(LeaveVoice { guild_id }).await?;
                Ok(replies::disconnected().edit())
            }
            SlashCommand::Skip => {
                services.skip.handle(SkipSpeech { guild_id }).await?;
                Ok(replies::skipped().edit())
            }
            SlashCommand::DictPut { word, reading } => {
                let record = services
                    .put_word
                    .handle(PutWord {
                        guild_id,
                        word,
                        reading,
                    })
                    .await?;
                Ok(replies::word_put(&record).edit())
            }
            SlashCommand::DictDelete { word } => {
                let entry = services
                    .delete_word
                    .handle(DeleteWord { guild_id, word })
                    .await?;
                Ok(replies::word_deleted(&entry).edit())
            }
            SlashCommand::DictList => {
                let list = services.list_words.handle(ListWords { guild_id }).await?;
                tracing::debug!(guild_id = %guild_id, count = list.count, "Sending dictionary list");
                Ok(EditInteractionResponse::new()
                    .new_attachment(CreateAttachment::bytes(list.csv.into_bytes(), "list.csv")))
            }
            SlashCommand::Voice { voice, pitch, speed } => {
                self.voice(user_id, voice, pitch, speed).await
            }
        }
    }

    async fn voice(
        &self,
        user_id: UserId,
        voice: Option<String>,
        pitch: Option<f32>,
        speed: Option<f32>,
    ) -> Result<EditInteractionResponse, ApplicationError> {
        let params = if voice.is_none() && pitch.is_none() && speed.is_none() {
            self.services
                .get_preference
                .handle(GetVoicePreference { user_id })
                .await?
        } else {
            self.services
                .set_preference
                .handle(SetVoicePreference {
                    user_id,
                    voice,
                    pitch,
                    speed,
                })
                .await?
        };
        Ok(replies::voice_preference(&params).edit())
    }

    async fn respond(&self, ctx: &Context, cmd: &CommandInteraction, response: EditInteractionResponse) {
        if let Err(e) = cmd.edit_response(&ctx.http, response).await {
            tracing::warn!(name = %cmd.data.name, error = %e, "Failed to edit interaction response");
        }
    }

    async fn handle_autocomplete(&self, ctx: &Context, cmd: &CommandInteraction) {
        let Some(guild_id) = cmd.guild_id.map(guild_id) else {
            return;
        };
        if cmd.data.name != "dict" {
            return;
        }
        let prefix = cmd
            .data
            .autocomplete()
            .map(|option| option.value.to_string())
            .unwrap_or_default();

        let words = match self
            .services
            .suggest_words
            .handle(SuggestWords {
                guild_id,
                prefix,
                limit: MAX_SUGGESTIONS,
            })
            .await
        {
            Ok(words) => words,
            Err(e) => {
                tracing::warn!(guild_id = %guild_id, error = %e, "Word suggestion failed");
                Vec::new()
            }
        };

        let choices = words
            .into_iter()
            .fold(CreateAutocompleteResponse::new(), |response, word| {
                response.add_string_choice(word.clone(), word)
            });
        if let Err(e) = cmd
            .create_response(&ctx.http, CreateInteractionResponse::Autocomplete(choices))
            .await
        {
            tracing::debug!(error = %e, "Failed to send autocomplete choices");
        }
    }

    /// Bot 自己被移出或被移到别的语音频道时销毁会话
    async fn on_self_voice_state(&self, guild_id: GuildId, presence: &VoicePresence) {
        let Some(session) = self.services.registry.get(guild_id) else {
            return;
        };
        if !session_lost(session.voice_channel_id(), presence) {
            return;
        }
        tracing::info!(
            guild_id = %guild_id,
            session_channel = %session.voice_channel_id(),
            current = ?presence.channel_id,
            "Bot is no longer in the session's voice channel, destroying session"
        );
        session.destroy().await;
    }
}

/// Bot 当前所在频道已不是会话的语音频道
fn session_lost(session_channel: ChannelId, presence: &VoicePresence) -> bool {
    presence.channel_id != Some(session_channel)
}

#[serenity::async_trait]
impl EventHandler for DiscordHandler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        let id = user_id(ready.user.id);
        if self.self_user_id.set(id).is_err() && self.self_user_id.get() != Some(&id) {
            tracing::warn!(user_id = %id, "Gateway identity changed after first ready");
        }
        tracing::info!(
            user = %ready.user.name,
            user_id = %id,
            guilds = ready.guilds.len(),
            "Discord ready"
        );
        self.register_commands(&ctx).await;
    }

    async fn guild_create(&self, _ctx: Context, guild: Guild, _is_new: Option<bool>) {
        let gid = guild_id(guild.id);
        let directory = &self.services.directory;

        for (id, member) in &guild.members {
            directory.replace_member(gid, user_id(*id), member_profile(member));
        }
        for (id, channel) in &guild.channels {
            directory.upsert_channel(gid, channel_id(*id), channel.name.clone());
        }
        for (id, state) in &guild.voice_states {
            self.services
                .tracker
                .seed(gid, user_id(*id), voice_presence(state));
        }

        tracing::info!(
            guild_id = %gid,
            members = guild.members.len(),
            channels = guild.channels.len(),
            voice_states = guild.voice_states.len(),
            "Guild cached"
        );
    }

    async fn guild_delete(&self, _ctx: Context, incomplete: UnavailableGuild, _full: Option<Guild>) {
        let gid = guild_id(incomplete.id);
        if let Some(session) = self.services.registry.get(gid) {
            session.destroy().await;
        }
        // 服务器暂时不可用时保留缓存
        if !incomplete.unavailable {
            self.services.directory.forget_guild(gid);
            self.services.tracker.forget_guild(gid);
            tracing::info!(guild_id = %gid, "Removed from guild");
        }
    }

    async fn guild_member_addition(&self, _ctx: Context, member: Member) {
        self.services.directory.replace_member(
            guild_id(member.guild_id),
            user_id(member.user.id),
            member_profile(&member),
        );
    }

    async fn guild_member_update(
        &self,
        _ctx: Context,
        _old: Option<Member>,
        _new: Option<Member>,
        event: GuildMemberUpdateEvent,
    ) {
        let mut profile = user_profile(&event.user);
        profile.nick = event.nick.clone();
        self.services
            .directory
            .replace_member(guild_id(event.guild_id), user_id(event.user.id), profile);
    }

    async fn channel_create(&self, _ctx: Context, channel: GuildChannel) {
        self.services.directory.upsert_channel(
            guild_id(channel.guild_id),
            channel_id(channel.id),
            channel.name.clone(),
        );
    }

    async fn channel_update(&self, _ctx: Context, _old: Option<GuildChannel>, new: GuildChannel) {
        self.services.directory.upsert_channel(
            guild_id(new.guild_id),
            channel_id(new.id),
            new.name.clone(),
        );
    }

    async fn channel_delete(
        &self,
        _ctx: Context,
        channel: GuildChannel,
        _messages: Option<Vec<Message>>,
    ) {
        self.services
            .directory
            .remove_channel(guild_id(channel.guild_id), channel_id(channel.id));
    }

    async fn voice_state_update(&self, _ctx: Context, _old: Option<VoiceState>, new: VoiceState) {
        let Some(gid) = new.guild_id.map(guild_id) else {
            return;
        };
        let uid = user_id(new.user_id);

        if let Some(member) = &new.member {
            self.services
                .directory
                .replace_member(gid, uid, member_profile(member));
        }

        let presence = voice_presence(&new);
        let transition = self.services.tracker.apply(gid, uid, presence.clone());
        tracing::debug!(
            guild_id = %gid,
            user_id = %uid,
            previous = ?transition.previous.channel_id,
            current = ?transition.current.channel_id,
            "Voice state updated"
        );

        if self.self_user_id.get() == Some(&uid) {
            self.on_self_voice_state(gid, &presence).await;
            return;
        }

        let Some(session) = self.services.registry.get(gid) else {
            return;
        };
        let directory = self.services.directory.clone();
        tokio::spawn(async move {
            session
                .handle_voice_state_transition(&transition, directory.as_ref())
                .await;
        });
    }

    async fn message(&self, _ctx: Context, msg: Message) {
        let Some(gid) = msg.guild_id.map(guild_id) else {
            return;
        };
        let author_id = user_id(msg.author.id);

        let directory = &self.services.directory;
        match &msg.member {
            Some(member) => {
                let author = MemberProfile {
                    nick: member.nick.clone(),
                    ..user_profile(&msg.author)
                };
                directory.replace_member(gid, author_id, author);
            }
            None => directory.upsert_member(gid, author_id, user_profile(&msg.author)),
        }
        for mentioned in &msg.mentions {
            directory.upsert_member(gid, user_id(mentioned.id), user_profile(mentioned));
        }

        let command = SpeakMessage {
            guild_id: gid,
            channel_id: channel_id(msg.channel_id),
            author_id,
            author_is_bot: msg.author.bot,
            content: msg.content.clone(),
        };
        let services = self.services.clone();
        tokio::spawn(async move {
            match services.speak.handle(command).await {
                Ok(SpeakOutcome::Spoken(_)) | Ok(SpeakOutcome::Ignored) => {}
                Err(e) => tracing::warn!(guild_id = %gid, error = %e, "Failed to speak message"),
            }
        });
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        match interaction {
            Interaction::Command(cmd) => self.handle_command(&ctx, &cmd).await,
            Interaction::Autocomplete(cmd) => self.handle_autocomplete(&ctx, &cmd).await,
            _ => {}
        }
    }
}

fn guild_id(id: serenity::all::GuildId) -> GuildId {
    GuildId::new(id.get())
}

fn channel_id(id: serenity::all::ChannelId) -> ChannelId {
    ChannelId::new(id.get())
}

fn user_id(id: serenity::all::UserId) -> UserId {
    UserId::new(id.get())
}

fn user_profile(user: &User) -> MemberProfile {
    MemberProfile {
        user_id: Some(user_id(user.id)),
        nick: None,
        global_name: user.global_name.clone(),
        username: Some(user.name.clone()),
    }
}

fn member_profile(member: &Member) -> MemberProfile {
    MemberProfile {
        nick: member.nick.clone(),
        ..user_profile(&member.user)
    }
}

fn voice_presence(state: &VoiceState) -> VoicePresence {
    VoicePresence {
        channel_id: state.channel_id.map(channel_id),
        self_stream: state.self_stream.unwrap_or(false),
        self_video: state.self_video,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_conversion_keeps_snowflake() {
        let id = serenity::all::GuildId::new(81384788765712384);
        assert_eq!(guild_id(id).get(), 81384788765712384);
        assert_eq!(user_id(serenity::all::UserId::new(7)), UserId::new(7));
        assert_eq!(channel_id(serenity::all::ChannelId::new(9)), ChannelId::new(9));
    }

    #[test]
    fn test_session_lost_when_bot_leaves_or_is_moved() {
        let channel = ChannelId::new(100);
        assert!(!session_lost(channel, &VoicePresence::in_channel(channel)));
        assert!(!session_lost(channel, &VoicePresence::in_channel(channel).streaming(true)));
        assert!(session_lost(channel, &VoicePresence::disconnected()));
        assert!(session_lost(channel, &VoicePresence::in_channel(ChannelId::new(101))));
    }
}
