use bytes::Bytes;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::{sleep, Duration};

use redstore::connection::Connection;
use redstore::frame::Frame;
use redstore::server;

/// Start a server on `port` and wait until it accepts connections.
async fn start_server(port: u16) {
    tokio::spawn(async move {
        let _ = server::run(port).await;
    });

    for _ in 0..50 {
        if TcpStream::connect(("127.0.0.1", port)).await.is_ok() {
            return;
        }
        sleep(Duration::from_millis(20)).await;
    }
    panic!("server did not start on port {}", port);
}

struct TestClient {
    conn: Connection,
}

impl TestClient {
    async fn connect(port: u16) -> TestClient {
        start_server(port).await;
        let stream = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
        TestClient {
            conn: Connection::new(stream),
        }
    }

    async fn cmd(&mut self, tokens: &[&str]) -> Frame {
        let request = Frame::Array(
            tokens
                .iter()
                .map(|token| Frame::Bulk(Bytes::copy_from_slice(token.as_bytes())))
                .collect(),
        );
        self.conn.write_frame(&request).await.unwrap();
        self.conn.read_frame().await.unwrap().unwrap()
    }
}

fn simple(s: &str) -> Frame {
    Frame::Simple(s.to_string())
}

fn bulk(s: &str) -> Frame {
    Frame::Bulk(Bytes::copy_from_slice(s.as_bytes()))
}

#[tokio::test]
async fn ping_and_echo() {
    let mut client = TestClient::connect(16400).await;

    assert_eq!(client.cmd(&["PING"]).await, simple("PONG"));
    assert_eq!(client.cmd(&["ECHO", "hello"]).await, bulk("hello"));

    // A bulk argument may carry CRLF; the reply must stay framed.
    assert_eq!(
        client.cmd(&["ECHO", "a\r\nb"]).await,
        Frame::Bulk(Bytes::from_static(b"a\r\nb"))
    );
    assert_eq!(client.cmd(&["PING"]).await, simple("PONG"));
}

#[tokio::test]
async fn wire_level_ping_and_set_get() {
    start_server(16401).await;
    let mut stream = TcpStream::connect(("127.0.0.1", 16401)).await.unwrap();

    async fn roundtrip(stream: &mut TcpStream, request: &[u8], reply: &[u8]) {
        stream.write_all(request).await.unwrap();
        let mut actual = vec![0u8; reply.len()];
        stream.read_exact(&mut actual).await.unwrap();
        assert_eq!(actual, reply);
    }

    roundtrip(&mut stream, b"*1\r\n$4\r\nPING\r\n", b"+PONG\r\n").await;
    roundtrip(
        &mut stream,
        b"*3\r\n$3\r\nSET\r\n$3\r\nfoo\r\n$3\r\nbar\r\n",
        b"+OK\r\n",
    )
    .await;
    roundtrip(
        &mut stream,
        b"*2\r\n$3\r\nGET\r\n$3\r\nfoo\r\n",
        b"$3\r\nbar\r\n",
    )
    .await;

    // Inline fallback for interactive clients.
    roundtrip(&mut stream, b"PING\r\n", b"+PONG\r\n").await;
    roundtrip(&mut stream, b"GET foo\n", b"$3\r\nbar\r\n").await;
}

#[tokio::test]
async fn get_missing_key_is_null() {
    let mut client = TestClient::connect(16402).await;

    assert_eq!(client.cmd(&["GET", "missing_key_xyz"]).await, Frame::Null);
}

#[tokio::test]
async fn lpush_then_lindex() {
    let mut client = TestClient::connect(16403).await;

    assert_eq!(
        client.cmd(&["LPUSH", "it_mylist", "a", "b", "c"]).await,
        Frame::Integer(3)
    );
    assert_eq!(client.cmd(&["LINDEX", "it_mylist", "0"]).await, bulk("c"));
    assert_eq!(client.cmd(&["LINDEX", "it_mylist", "-1"]).await, bulk("a"));
    assert_eq!(client.cmd(&["LLEN", "it_mylist"]).await, Frame::Integer(3));
}

#[tokio::test]
async fn list_pop_and_rem() {
    let mut client = TestClient::connect(16404).await;

    client.cmd(&["RPUSH", "it_l2", "x", "y", "x", "z"]).await;
    assert_eq!(client.cmd(&["LPOP", "it_l2"]).await, bulk("x"));
    assert_eq!(client.cmd(&["RPOP", "it_l2"]).await, bulk("z"));
    assert_eq!(
        client.cmd(&["LREM", "it_l2", "0", "x"]).await,
        Frame::Integer(1)
    );
    assert_eq!(client.cmd(&["LPOP", "it_l2"]).await, bulk("y"));
    // The list emptied out, so the key is gone.
    assert_eq!(client.cmd(&["TYPE", "it_l2"]).await, simple("none"));
    assert_eq!(client.cmd(&["LPOP", "it_l2"]).await, Frame::Null);
}

#[tokio::test]
async fn lset_out_of_range_fails() {
    let mut client = TestClient::connect(16405).await;

    client.cmd(&["RPUSH", "it_l3", "a", "b"]).await;
    assert_eq!(client.cmd(&["LSET", "it_l3", "1", "c"]).await, simple("OK"));
    assert_eq!(client.cmd(&["LINDEX", "it_l3", "1"]).await, bulk("c"));
    assert_eq!(
        client.cmd(&["LSET", "it_l3", "5", "d"]).await,
        Frame::Error("Error: LSET failed".to_string())
    );
}

#[tokio::test]
async fn hash_commands() {
    let mut client = TestClient::connect(16406).await;

    assert_eq!(
        client.cmd(&["HSET", "it_h", "f1", "v1"]).await,
        Frame::Integer(1)
    );
    assert_eq!(
        client.cmd(&["HSET", "it_h", "f2", "v2"]).await,
        Frame::Integer(1)
    );
    assert_eq!(
        client.cmd(&["HSET", "it_h", "f1", "v1b"]).await,
        Frame::Integer(0)
    );

    assert_eq!(client.cmd(&["HGET", "it_h", "f1"]).await, bulk("v1b"));
    assert_eq!(client.cmd(&["HGET", "it_h", "nope"]).await, Frame::Null);
    assert_eq!(
        client.cmd(&["HEXISTS", "it_h", "f2"]).await,
        Frame::Integer(1)
    );
    assert_eq!(client.cmd(&["HLEN", "it_h"]).await, Frame::Integer(2));

    let reply = client.cmd(&["HGETALL", "it_h"]).await;
    let Frame::Array(frames) = reply else {
        panic!("HGETALL must reply with an array");
    };
    assert_eq!(frames.len(), 4);
    // Pair order is unspecified; check both allowed layouts.
    let first_pair = (frames[0].clone(), frames[1].clone());
    let second_pair = (frames[2].clone(), frames[3].clone());
    let expected_a = (bulk("f1"), bulk("v1b"));
    let expected_b = (bulk("f2"), bulk("v2"));
    assert!(
        (first_pair == expected_a && second_pair == expected_b)
            || (first_pair == expected_b && second_pair == expected_a)
    );

    assert_eq!(
        client.cmd(&["HDEL", "it_h", "f1"]).await,
        Frame::Integer(1)
    );
    assert_eq!(
        client.cmd(&["HDEL", "it_h", "f1"]).await,
        Frame::Integer(0)
    );
}

#[tokio::test]
async fn hmset_writes_pairs_atomically() {
    let mut client = TestClient::connect(16407).await;

    assert_eq!(
        client
            .cmd(&["HMSET", "it_hm", "f1", "v1", "f2", "v2"])
            .await,
        simple("OK")
    );
    assert_eq!(client.cmd(&["HLEN", "it_hm"]).await, Frame::Integer(2));

    assert_eq!(
        client.cmd(&["HMSET", "it_hm", "f3"]).await,
        Frame::Error("Error: HMSET requires key and field value pairs".to_string())
    );
}

#[tokio::test]
async fn expire_makes_key_vanish() {
    let mut client = TestClient::connect(16408).await;

    assert_eq!(client.cmd(&["SET", "it_exp", "v"]).await, simple("OK"));
    assert_eq!(client.cmd(&["EXPIRE", "it_exp", "1"]).await, simple("OK"));

    sleep(Duration::from_millis(1600)).await;

    assert_eq!(client.cmd(&["GET", "it_exp"]).await, Frame::Null);
    assert_eq!(client.cmd(&["TYPE", "it_exp"]).await, simple("none"));
}

#[tokio::test]
async fn rename_missing_source_is_an_error() {
    let mut client = TestClient::connect(16409).await;

    assert_eq!(
        client.cmd(&["RENAME", "it_ghost", "it_other"]).await,
        Frame::Error("Error: RENAME failed".to_string())
    );
}

#[tokio::test]
async fn rename_preserves_type() {
    let mut client = TestClient::connect(16410).await;

    client.cmd(&["RPUSH", "it_src", "a"]).await;
    assert_eq!(
        client.cmd(&["RENAME", "it_src", "it_dst"]).await,
        simple("OK")
    );
    assert_eq!(client.cmd(&["TYPE", "it_dst"]).await, simple("list"));
    assert_eq!(client.cmd(&["TYPE", "it_src"]).await, simple("none"));
}

#[tokio::test]
async fn del_and_unlink() {
    let mut client = TestClient::connect(16411).await;

    client.cmd(&["SET", "it_d1", "v"]).await;
    client.cmd(&["SET", "it_d2", "v"]).await;

    assert_eq!(client.cmd(&["DEL", "it_d1"]).await, Frame::Integer(1));
    assert_eq!(client.cmd(&["DEL", "it_d1"]).await, Frame::Integer(0));
    assert_eq!(client.cmd(&["UNLINK", "it_d2"]).await, Frame::Integer(1));
}

#[tokio::test]
async fn flushall_then_keys_is_empty() {
    let mut client = TestClient::connect(16412).await;

    client.cmd(&["SET", "it_f1", "v"]).await;
    client.cmd(&["RPUSH", "it_f2", "a"]).await;
    client.cmd(&["HSET", "it_f3", "f", "v"]).await;

    assert_eq!(client.cmd(&["FLUSHALL"]).await, simple("OK"));

    let Frame::Array(keys) = client.cmd(&["KEYS"]).await else {
        panic!("KEYS must reply with an array");
    };
    assert!(keys.is_empty());
}

#[tokio::test]
async fn type_reports_each_variant() {
    let mut client = TestClient::connect(16413).await;

    client.cmd(&["SET", "it_ts", "v"]).await;
    client.cmd(&["RPUSH", "it_tl", "a"]).await;
    client.cmd(&["HSET", "it_th", "f", "v"]).await;

    assert_eq!(client.cmd(&["TYPE", "it_ts"]).await, simple("string"));
    assert_eq!(client.cmd(&["TYPE", "it_tl"]).await, simple("list"));
    assert_eq!(client.cmd(&["TYPE", "it_th"]).await, simple("hash"));
    assert_eq!(client.cmd(&["TYPE", "it_tnone"]).await, simple("none"));
}

#[tokio::test]
async fn dispatch_errors_keep_the_connection_usable() {
    let mut client = TestClient::connect(16414).await;

    assert_eq!(
        client.cmd(&["NOSUCHCMD", "x"]).await,
        Frame::Error("Error: Unknown command 'NOSUCHCMD'".to_string())
    );
    assert_eq!(
        client.cmd(&["SET", "only_key"]).await,
        Frame::Error("Error: SET requires key and value".to_string())
    );
    assert_eq!(
        client.cmd(&["LINDEX", "l", "abc"]).await,
        Frame::Error("Error: Invalid index for LINDEX".to_string())
    );

    // The same connection still serves well-formed requests.
    assert_eq!(client.cmd(&["PING"]).await, simple("PONG"));
}

#[tokio::test]
async fn malformed_frame_closes_the_connection() {
    start_server(16415).await;
    let mut stream = TcpStream::connect(("127.0.0.1", 16415)).await.unwrap();

    // An array whose element is not a bulk string violates the request
    // grammar.
    stream.write_all(b"*1\r\n:5\r\n").await.unwrap();

    let mut reply = Vec::new();
    stream.read_to_end(&mut reply).await.unwrap();

    // One best-effort error reply, then EOF.
    assert!(reply.starts_with(b"-Error: "));
    assert!(reply.ends_with(b"\r\n"));
}

#[tokio::test]
async fn per_connection_replies_stay_ordered() {
    start_server(16416).await;

    let mut tasks = vec![];
    for client_id in 0..4 {
        tasks.push(tokio::spawn(async move {
            let stream = TcpStream::connect(("127.0.0.1", 16416)).await.unwrap();
            let mut conn = Connection::new(stream);
            let key = format!("it_order_{}", client_id);

            for round in 0..25 {
                let value = format!("v{}", round);
                let set = Frame::Array(vec![
                    Frame::Bulk(Bytes::from("SET")),
                    Frame::Bulk(Bytes::copy_from_slice(key.as_bytes())),
                    Frame::Bulk(Bytes::copy_from_slice(value.as_bytes())),
                ]);
                conn.write_frame(&set).await.unwrap();
                assert_eq!(
                    conn.read_frame().await.unwrap().unwrap(),
                    Frame::Simple("OK".to_string())
                );

                let get = Frame::Array(vec![
                    Frame::Bulk(Bytes::from("GET")),
                    Frame::Bulk(Bytes::copy_from_slice(key.as_bytes())),
                ]);
                conn.write_frame(&get).await.unwrap();
                assert_eq!(
                    conn.read_frame().await.unwrap().unwrap(),
                    Frame::Bulk(Bytes::copy_from_slice(value.as_bytes()))
                );
            }
        }));
    }

    for task in tasks {
        task.await.unwrap();
    }
}

#[tokio::test]
async fn pipelined_requests_are_answered_in_order() {
    start_server(16417).await;
    let mut stream = TcpStream::connect(("127.0.0.1", 16417)).await.unwrap();

    // Two requests in a single write; replies must come back in order.
    stream
        .write_all(b"*3\r\n$3\r\nSET\r\n$6\r\nit_pip\r\n$1\r\nv\r\n*2\r\n$3\r\nGET\r\n$6\r\nit_pip\r\n")
        .await
        .unwrap();

    let mut reply = vec![0u8; b"+OK\r\n$1\r\nv\r\n".len()];
    stream.read_exact(&mut reply).await.unwrap();
    assert_eq!(reply, b"+OK\r\n$1\r\nv\r\n");
}
