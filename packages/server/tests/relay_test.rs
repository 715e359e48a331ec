//! Relay server integration tests
//!
//! A real `Server` is bound to 127.0.0.1:0 and driven through the client
//! library, so these cover the reactor, the codec and the dispatcher together.

use std::{sync::Arc, time::Duration};

use sharecast_client::{RelayClient, ServerEvent};
use sharecast_server::{Server, ServerConfig};
use sharecast_shared::{
    protocol::{Command, FrameDecoder, SystemCode, build_text_frame, encode},
    time::{FixedClock, format_local_clock_time},
};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
    sync::oneshot,
    task::JoinHandle,
};

const TS: i64 = 1_704_112_440_000;
const RECV_TIMEOUT: Duration = Duration::from_secs(5);

struct TestServer {
    addr: String,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl TestServer {
    async fn start() -> Self {
        let config = ServerConfig {
            port: 0,
            poll_interval: Duration::from_millis(20),
            ..ServerConfig::default()
        };
        let server = Server::bind_with_clock(config, Arc::new(FixedClock::new(TS)))
            .await
            .unwrap();
        let addr = server.local_addr().unwrap().to_string();
        let (tx, rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            server
                .run_until(async {
                    rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            shutdown: Some(tx),
            handle,
        }
    }

    async fn connect(&self, name: &str) -> RelayClient {
        RelayClient::connect(self.addr.as_str(), name).await.unwrap()
    }

    async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            tx.send(()).ok();
        }
        tokio::time::timeout(RECV_TIMEOUT, self.handle)
            .await
            .expect("server did not shut down")
            .unwrap();
    }
}

fn text(body: &str) -> ServerEvent {
    ServerEvent::Text(format!("{} {}", format_local_clock_time(TS), body))
}

async fn recv(client: &mut RelayClient) -> ServerEvent {
    tokio::time::timeout(RECV_TIMEOUT, client.recv())
        .await
        .expect("timed out waiting for server event")
        .unwrap()
}

/// Alice and Bob, with the join notice already consumed.
async fn alice_and_bob(server: &TestServer) -> (RelayClient, RelayClient) {
    let mut alice = server.connect("Alice").await;
    let bob = server.connect("Bob").await;
    assert_eq!(recv(&mut alice).await, text("Bob joined the chat."));
    (alice, bob)
}

#[tokio::test]
async fn test_registration_announces_newcomer() {
    // テスト項目: 登録するとセッション ID が返り、既存の参加者に参加通知が届く
    // given (前提条件):
    let server = TestServer::start().await;
    let mut alice = server.connect("Alice").await;

    // when (操作):
    let bob = server.connect("Bob").await;

    // then (期待する結果):
    assert_eq!(alice.session_id().len(), 36);
    assert_ne!(alice.session_id(), bob.session_id());
    assert_eq!(recv(&mut alice).await, text("Bob joined the chat."));
    server.stop().await;
}

#[tokio::test]
async fn test_chat_reaches_others_but_not_sender() {
    // テスト項目: チャットは送信者以外に届き、送信者には返ってこない
    // given (前提条件):
    let server = TestServer::start().await;
    let (mut alice, mut bob) = alice_and_bob(&server).await;

    // when (操作):
    alice.send_command(Command::SendMessage, "hi Bob").await.unwrap();
    let bob_received = recv(&mut bob).await;
    bob.send_command(Command::SendMessage, "hi Alice").await.unwrap();

    // then (期待する結果):
    assert_eq!(bob_received, text("Alice : hi Bob"));
    // Alice の次のイベントは Bob の返信（自分のメッセージは届かない）
    assert_eq!(recv(&mut alice).await, text("Bob : hi Alice"));
    server.stop().await;
}

#[tokio::test]
async fn test_private_message() {
    // テスト項目: プライベートメッセージは宛先にだけ届く
    // given (前提条件):
    let server = TestServer::start().await;
    let (mut alice, mut bob) = alice_and_bob(&server).await;

    // when (操作):
    bob.send_command(Command::SendPrivateMessage, "Alice|secret")
        .await
        .unwrap();

    // then (期待する結果):
    assert_eq!(
        recv(&mut alice).await,
        text("Private Message From Bob : secret")
    );
    server.stop().await;
}

#[tokio::test]
async fn test_screen_share_scenario() {
    // テスト項目: 共有開始 → 視聴参加 → フレーム中継 → 共有終了がソケット越しに成立する
    // given (前提条件):
    let server = TestServer::start().await;
    let (mut alice, mut bob) = alice_and_bob(&server).await;

    // when (操作): Alice が共有を開始
    alice
        .send_command(Command::StartShareScreen, "")
        .await
        .unwrap();

    // then (期待する結果):
    assert_eq!(
        recv(&mut alice).await,
        ServerEvent::System(SystemCode::ConfirmStart)
    );
    assert_eq!(recv(&mut bob).await, text("Alice started sharing screen."));

    // when (操作): Bob が視聴に参加
    bob.send_command(Command::JoinShareScreen, "Alice")
        .await
        .unwrap();

    // then (期待する結果):
    assert_eq!(
        recv(&mut bob).await,
        ServerEvent::System(SystemCode::ConfirmJoin)
    );
    assert_eq!(recv(&mut bob).await, text("Bob joined stream."));
    assert_eq!(recv(&mut alice).await, text("Bob joined stream."));

    // when (操作): Alice がフレームを送信
    let frame: Vec<u8> = (0..=255u8).cycle().take(100_000).collect();
    alice.send_frame(&frame).await.unwrap();

    // then (期待する結果):
    assert_eq!(recv(&mut bob).await, ServerEvent::Frame(frame));

    // when (操作): Alice が共有を終了
    alice.send_command(Command::EndShareScreen, "").await.unwrap();

    // then (期待する結果): 視聴者は誰が終了したかを知らされてから切り離される
    assert_eq!(recv(&mut bob).await, text("Alice ended stream."));
    assert_eq!(
        recv(&mut bob).await,
        ServerEvent::System(SystemCode::Disconnect)
    );
    assert_eq!(recv(&mut bob).await, text("Bob left stream."));
    assert_eq!(recv(&mut alice).await, text("Bob left stream."));
    assert_eq!(recv(&mut alice).await, text("Alice ended stream."));
    server.stop().await;
}

#[tokio::test]
async fn test_unknown_command_is_rejected_to_sender_only() {
    // テスト項目: 未知のコマンドは送信者だけにエラーが返り、他の参加者には何も届かない
    // given (前提条件):
    let server = TestServer::start().await;
    let (mut alice, mut bob) = alice_and_bob(&server).await;
    let payload = format!("{}|0|DANCE|now", alice.session_id());

    // when (操作):
    alice.send_payload(payload.as_bytes()).await.unwrap();
    let reply = recv(&mut alice).await;
    alice.send_command(Command::SendMessage, "still here").await.unwrap();

    // then (期待する結果):
    assert_eq!(reply, text("Error: unknown command \"DANCE\""));
    assert_eq!(recv(&mut bob).await, text("Alice : still here"));
    server.stop().await;
}

#[tokio::test]
async fn test_foreign_session_id_is_rejected() {
    // テスト項目: 他人のセッション ID を名乗ったフレームは拒否される
    // given (前提条件):
    let server = TestServer::start().await;
    let (mut alice, bob) = alice_and_bob(&server).await;
    let forged = build_text_frame(bob.session_id(), Command::SendMessage, "I am Bob");

    // when (操作):
    alice.send_payload(&forged).await.unwrap();

    // then (期待する結果):
    assert_eq!(
        recv(&mut alice).await,
        text("Error: session id does not match this connection")
    );
    server.stop().await;
}

#[tokio::test]
async fn test_malformed_envelope_keeps_connection() {
    // テスト項目: 壊れたエンベロープはエラー通知で終わり、同じ接続で通信を続けられる
    // given (前提条件):
    let server = TestServer::start().await;
    let mut alice = server.connect("Alice").await;
    let mut eve = TcpStream::connect(server.addr.as_str()).await.unwrap();
    let mut decoder = FrameDecoder::new();
    eve.write_all(&encode(b"Eve")).await.unwrap();
    let session_id = String::from_utf8(read_payload(&mut eve, &mut decoder).await).unwrap();
    assert_eq!(recv(&mut alice).await, text("Eve joined the chat."));

    // when (操作):
    eve.write_all(b"abc|").await.unwrap();
    eve.write_all(&encode(&build_text_frame(
        &session_id,
        Command::SendMessage,
        "recovered",
    )))
    .await
    .unwrap();

    // then (期待する結果):
    let error = read_payload(&mut eve, &mut decoder).await;
    assert!(String::from_utf8_lossy(&error).contains("Error: malformed frame"));
    assert_eq!(recv(&mut alice).await, text("Eve : recovered"));
    server.stop().await;
}

#[tokio::test]
async fn test_invalid_display_name_closes_connection() {
    // テスト項目: 空の表示名で登録しようとすると接続が閉じられる
    // given (前提条件):
    let server = TestServer::start().await;

    // when (操作):
    let result = RelayClient::connect(server.addr.as_str(), "   ").await;

    // then (期待する結果):
    assert!(result.is_err());
    server.stop().await;
}

#[tokio::test]
async fn test_owner_quit_promotes_next_session() {
    // テスト項目: Owner が QUIT すると次のセッションが Owner になり、管理コマンドを使える
    // given (前提条件):
    let server = TestServer::start().await;
    let (mut alice, mut bob) = alice_and_bob(&server).await;
    let mut carol = server.connect("Carol").await;
    assert_eq!(recv(&mut alice).await, text("Carol joined the chat."));
    assert_eq!(recv(&mut bob).await, text("Carol joined the chat."));

    // when (操作):
    alice.send_command(Command::Quit, "").await.unwrap();

    // then (期待する結果):
    assert_eq!(recv(&mut alice).await, ServerEvent::Closed);
    assert_eq!(recv(&mut bob).await, text("Bob is now the Owner."));
    assert_eq!(recv(&mut bob).await, text("Alice left the chat."));
    assert_eq!(recv(&mut carol).await, text("Bob is now the Owner."));
    assert_eq!(recv(&mut carol).await, text("Alice left the chat."));

    // when (操作): 新しい Owner が Carol を KICK
    bob.send_command(Command::KickUser, "Carol").await.unwrap();

    // then (期待する結果):
    assert_eq!(recv(&mut carol).await, text("You were kicked by Bob."));
    assert_eq!(recv(&mut carol).await, ServerEvent::Closed);
    assert_eq!(recv(&mut bob).await, text("Carol was kicked by Bob."));
    assert_eq!(recv(&mut bob).await, text("Carol left the chat."));
    server.stop().await;
}

#[tokio::test]
async fn test_peer_disconnect_tears_down_session() {
    // テスト項目: クライアントがソケットを閉じると、残りの参加者に離脱通知が届く
    // given (前提条件):
    let server = TestServer::start().await;
    let (mut alice, bob) = alice_and_bob(&server).await;

    // when (操作):
    drop(bob);

    // then (期待する結果):
    assert_eq!(recv(&mut alice).await, text("Bob left the chat."));
    server.stop().await;
}

async fn read_payload(stream: &mut TcpStream, decoder: &mut FrameDecoder) -> Vec<u8> {
    let mut buf = [0u8; 4096];
    loop {
        if let Some(payload) = decoder.decode_next().unwrap() {
            return payload;
        }
        let n = tokio::time::timeout(RECV_TIMEOUT, stream.read(&mut buf))
            .await
            .expect("timed out waiting for server")
            .unwrap();
        assert!(n > 0, "server closed the connection");
        decoder.feed(&buf[..n]);
    }
}
