use tracing::{info, warn};

use crate::adapter::{Bidder, BidderResponse, HttpResponse};
use crate::bidding::exchange_client::Transport;
use crate::error::{AdapterError, AuctionError, DispatchError};
use crate::openrtb::request::BidRequest;

/// 一次竞价的结果：第一个成功发送的交易所响应原样回传给调用方
#[derive(Debug)]
pub struct AuctionOutcome {
    /// 适配器生成的 wire 请求数量
    pub wire_requests: usize,
    /// 交易所的原始响应，状态码与 body 原样转发
    pub exchange_response: HttpResponse,
    /// 同一响应经 `make_bids` 归一化后的结果，仅用于日志
    pub normalized: Result<BidderResponse, AdapterError>,
    /// 在成功之前失败的发送
    pub failed_sends: Vec<DispatchError>,
}

/// 处理一次竞价：构造请求 -> 依次发送 -> 第一个成功的响应即返回
///
/// 不重试，也不切换交易所；发送失败只会跳到下一个 wire 请求。
pub async fn run_auction<T: Transport>(
    bidder: &dyn Bidder,
    transport: &T,
    bid_request: &BidRequest,
) -> Result<AuctionOutcome, AuctionError> {
    let wire_requests = bidder
        .make_requests(bid_request)
        .map_err(|e| AuctionError::MakeRequests(vec![e]))?;
    info!(
        request_id = %bid_request.id,
        bidder = bidder.name(),
        count = wire_requests.len(),
        "created wire requests"
    );

    let mut failed_sends = Vec::new();
    for (i, wire_request) in wire_requests.iter().enumerate() {
        let exchange_response = match transport.send(wire_request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(
                    request_id = %bid_request.id,
                    index = i,
                    uri = %wire_request.uri,
                    error = %e,
                    "failed to send wire request"
                );
                failed_sends.push(e);
                continue;
            }
        };

        info!(
            request_id = %bid_request.id,
            status = exchange_response.status_code,
            bytes = exchange_response.body.len(),
            "exchange responded"
        );

        let normalized = bidder.make_bids(bid_request, &exchange_response);
        return Ok(AuctionOutcome {
            wire_requests: wire_requests.len(),
            exchange_response,
            normalized,
            failed_sends,
        });
    }

    Err(AuctionError::AllSendsFailed(failed_sends))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::adapter::{HttpRequest, SmartAdServerBuilder};
    use crate::openrtb::request::Imp;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// 按脚本依次返回结果，并记录收到的请求
    #[derive(Default)]
    pub(crate) struct ScriptedTransport {
        replies: Mutex<VecDeque<Result<HttpResponse, DispatchError>>>,
        pub(crate) sent: Mutex<Vec<HttpRequest>>,
    }

    impl ScriptedTransport {
        pub(crate) fn replying(replies: Vec<Result<HttpResponse, DispatchError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                sent: Mutex::new(Vec::new()),
            }
        }
    }

    impl Transport for ScriptedTransport {
        async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, DispatchError> {
            self.sent.lock().unwrap().push(request.clone());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(DispatchError::Timeout(0)))
        }
    }

    pub(crate) const CONFIG: &str = "adapters:\n  smartadserver:\n    enabled: true\n    endpoint: http://exchange.test/bid\n    platform-id: 7\n";

    pub(crate) fn ok(status: u16, body: &str) -> Result<HttpResponse, DispatchError> {
        Ok(HttpResponse {
            status_code: status,
            body: body.as_bytes().to_vec(),
            headers: Default::default(),
        })
    }

    fn one_imp_request() -> BidRequest {
        BidRequest {
            id: "auction-1".to_string(),
            imp: vec![Imp { id: "1".to_string(), ..Default::default() }],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn relays_the_exchange_response() {
        let bidder = SmartAdServerBuilder.build(CONFIG.as_bytes()).unwrap();
        let body = r#"{"id":"auction-1","seatbid":[{"bid":[{"id":"b","impid":"1","price":2.0}]}]}"#;
        let transport = ScriptedTransport::replying(vec![ok(200, body)]);

        let outcome = run_auction(&bidder, &transport, &one_imp_request()).await.unwrap();

        assert_eq!(outcome.wire_requests, 1);
        assert_eq!(outcome.exchange_response.status_code, 200);
        assert_eq!(outcome.exchange_response.body, body.as_bytes());
        assert_eq!(outcome.normalized.unwrap().bids.len(), 1);
        assert!(outcome.failed_sends.is_empty());

        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].uri, "http://exchange.test/bid");
    }

    #[tokio::test]
    async fn no_content_is_relayed_as_no_bid() {
        let bidder = SmartAdServerBuilder.build(CONFIG.as_bytes()).unwrap();
        let transport = ScriptedTransport::replying(vec![ok(204, "")]);

        let outcome = run_auction(&bidder, &transport, &one_imp_request()).await.unwrap();

        assert_eq!(outcome.exchange_response.status_code, 204);
        assert!(outcome.normalized.unwrap().bids.is_empty());
    }

    #[tokio::test]
    async fn rejected_request_is_still_relayed_with_the_error_recorded() {
        let bidder = SmartAdServerBuilder.build(CONFIG.as_bytes()).unwrap();
        let transport = ScriptedTransport::replying(vec![ok(404, "unknown caller")]);

        let outcome = run_auction(&bidder, &transport, &one_imp_request()).await.unwrap();

        assert_eq!(outcome.exchange_response.status_code, 404);
        assert!(matches!(outcome.normalized, Err(AdapterError::NotFound { .. })));
    }

    #[tokio::test]
    async fn make_requests_failure_sends_nothing() {
        let bidder = SmartAdServerBuilder.build(CONFIG.as_bytes()).unwrap();
        let transport = ScriptedTransport::replying(vec![ok(200, "{}")]);
        let empty = BidRequest { id: "x".to_string(), ..Default::default() };

        let result = run_auction(&bidder, &transport, &empty).await;

        assert!(matches!(result, Err(AuctionError::MakeRequests(ref errs)) if errs.len() == 1));
        assert!(transport.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn send_failure_is_a_full_failure() {
        let bidder = SmartAdServerBuilder.build(CONFIG.as_bytes()).unwrap();
        let transport = ScriptedTransport::replying(vec![Err(DispatchError::Timeout(1000))]);

        let result = run_auction(&bidder, &transport, &one_imp_request()).await;

        match result {
            Err(AuctionError::AllSendsFailed(errs)) => {
                assert_eq!(errs.len(), 1);
                assert!(matches!(errs[0], DispatchError::Timeout(1000)));
            }
            other => panic!("expected AllSendsFailed, got {:?}", other),
        }
        assert_eq!(transport.sent.lock().unwrap().len(), 1);
    }
}
