use anyhow::Result;
use futures::stream::{self, BoxStream, StreamExt};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wick_core::Payload;
use wick_transport::{
    BoxFuture, Channel, Connector, Deadline, LocalChannel, LocalConnector, PayloadStream,
    Responder, SetupParams, TransportError, INBOUND_BUFFER,
};

/// Echoes every request back.
struct Echo;

impl Responder for Echo {
    fn request_response(&self, payload: Payload) -> BoxFuture<'static, Result<Payload, TransportError>> {
        Box::pin(async move { Ok(payload) })
    }

    fn request_channel(&self, payloads: BoxStream<'static, Payload>) -> PayloadStream {
        payloads.map(Ok).boxed()
    }
}

/// Never answers.
struct Silent;

impl Responder for Silent {
    fn request_response(&self, _payload: Payload) -> BoxFuture<'static, Result<Payload, TransportError>> {
        Box::pin(futures::future::pending())
    }

    fn request_channel(&self, _payloads: BoxStream<'static, Payload>) -> PayloadStream {
        stream::pending().boxed()
    }
}

/// Keeps every inbound stream alive without ever reading it.
#[derive(Default)]
struct Hoarder {
    held: Mutex<Vec<BoxStream<'static, Payload>>>,
}

impl Responder for Hoarder {
    fn request_response(&self, _payload: Payload) -> BoxFuture<'static, Result<Payload, TransportError>> {
        Box::pin(futures::future::pending())
    }

    fn request_channel(&self, payloads: BoxStream<'static, Payload>) -> PayloadStream {
        self.held.lock().unwrap().push(payloads);
        stream::pending().boxed()
    }
}

struct DropFlag(Arc<AtomicBool>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

fn outbound(items: Vec<&'static str>) -> PayloadStream {
    stream::iter(items.into_iter().map(|s| Ok(Payload::data(s.as_bytes())))).boxed()
}

#[tokio::test]
async fn connector_uses_fixed_keepalive_and_lifetime() -> Result<()> {
    let params = SetupParams::default();
    assert_eq!(params.keep_alive, Duration::from_secs(10));
    assert_eq!(params.lifetime, Duration::from_secs(20));

    let channel = LocalConnector::new(Arc::new(Echo)).connect(params).await?;
    assert!(!channel.is_closed());
    Ok(())
}

#[tokio::test]
async fn echo_preserves_order() -> Result<()> {
    let channel = LocalChannel::new(Arc::new(Echo));
    let replies: Vec<_> = channel
        .request_channel(outbound(vec!["a", "b", "c"]))
        .collect()
        .await;

    let bodies: Vec<_> = replies
        .into_iter()
        .map(|r| r.map(|p| p.data.unwrap()))
        .collect::<Result<_, _>>()?;
    assert_eq!(bodies, vec!["a", "b", "c"]);
    Ok(())
}

#[tokio::test]
async fn concurrent_requests_do_not_interleave() -> Result<()> {
    let channel = LocalChannel::new(Arc::new(Echo));
    let first = channel.request_channel(outbound(vec!["1a", "1b", "1c"]));
    let second = channel.request_channel(outbound(vec!["2a", "2b"]));

    let (first, second) = tokio::join!(
        first.collect::<Vec<_>>(),
        second.collect::<Vec<_>>()
    );
    assert!(first
        .iter()
        .all(|r| r.as_ref().unwrap().data.as_ref().unwrap().starts_with(b"1")));
    assert_eq!(first.len(), 3);
    assert_eq!(second.len(), 2);
    Ok(())
}

#[tokio::test]
async fn close_is_idempotent_and_fails_fast() -> Result<()> {
    let channel = LocalChannel::new(Arc::new(Echo));
    channel.close();
    channel.close();
    assert!(channel.is_closed());

    let err = channel.request_response(Payload::data("x")).await.unwrap_err();
    assert_eq!(err, TransportError::Closed);

    let replies: Vec<_> = channel.request_channel(outbound(vec!["a"])).collect().await;
    assert_eq!(replies, vec![Err(TransportError::Closed)]);
    Ok(())
}

#[tokio::test]
async fn close_fails_requests_in_flight() -> Result<()> {
    let channel = Arc::new(LocalChannel::new(Arc::new(Silent)));

    let pending = {
        let channel = channel.clone();
        tokio::spawn(async move { channel.request_response(Payload::data("x")).await })
    };
    let mut stream = channel.request_channel(outbound(vec!["a"]));
    let next = tokio::spawn(async move { stream.next().await });

    tokio::time::sleep(Duration::from_millis(20)).await;
    channel.close();

    let rr = tokio::time::timeout(Duration::from_secs(1), pending).await??;
    assert_eq!(rr, Err(TransportError::Closed));
    let item = tokio::time::timeout(Duration::from_secs(1), next).await??;
    assert_eq!(item, Some(Err(TransportError::Closed)));
    Ok(())
}

#[tokio::test]
async fn outbound_error_terminates_the_request() -> Result<()> {
    let channel = LocalChannel::new(Arc::new(Silent));
    let failing = stream::iter(vec![Err(TransportError::Outbound("bad frame".into()))]).boxed();
    let replies: Vec<_> = channel.request_channel(failing).collect().await;
    assert_eq!(
        replies,
        vec![Err(TransportError::Outbound("bad frame".into()))]
    );
    Ok(())
}

#[tokio::test]
async fn dropping_the_result_cancels_the_request() -> Result<()> {
    let channel = LocalChannel::new(Arc::new(Echo));
    let dropped = Arc::new(AtomicBool::new(false));
    let guard = DropFlag(dropped.clone());

    // Endless outbound stream that owns the guard.
    let endless = stream::repeat_with(move || {
        let _ = &guard;
        Ok(Payload::data("tick"))
    })
    .boxed();

    let mut replies = channel.request_channel(endless);
    assert!(replies.next().await.is_some());
    drop(replies);

    tokio::time::timeout(Duration::from_secs(1), async {
        while !dropped.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await?;
    Ok(())
}

#[tokio::test]
async fn deadline_turns_slow_replies_into_timeouts() {
    let channel = LocalChannel::new(Arc::new(Silent));
    let deadline = Deadline::new(Duration::from_millis(20));
    let err = deadline
        .execute(channel.request_response(Payload::data("x")))
        .await
        .unwrap_err();
    assert_eq!(err, TransportError::Timeout(Duration::from_millis(20)));
}

#[tokio::test]
async fn slow_responder_throttles_the_caller() -> Result<()> {
    let channel = LocalChannel::new(Arc::new(Hoarder::default()));
    let pulled = Arc::new(AtomicUsize::new(0));

    let counter = pulled.clone();
    let endless = stream::repeat_with(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(Payload::data(vec![0u8; 1024]))
    })
    .boxed();

    let mut replies = channel.request_channel(endless);
    let waiting = tokio::spawn(async move { replies.next().await });

    tokio::time::sleep(Duration::from_millis(100)).await;
    let seen = pulled.load(Ordering::SeqCst);
    assert!(seen > 0);
    // Queue capacity plus the frame held while waiting for room.
    assert!(seen <= INBOUND_BUFFER + 2, "pulled {} frames", seen);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(pulled.load(Ordering::SeqCst), seen);

    waiting.abort();
    Ok(())
}
