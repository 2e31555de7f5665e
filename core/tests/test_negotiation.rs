// Header negotiation and the client/server body wrappers, over an in-process
// loopback transport.

#[cfg(test)]
mod tests {
    use std::io::{self, Cursor, Read, Write};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::thread;
    use std::time::Duration;

    use bytes::Bytes;
    use http::header::{HeaderValue, ACCEPT_ENCODING, CONTENT_ENCODING};
    use http::{HeaderMap, Request, Response, StatusCode};

    use pingproto::config::{DecoderConfig, EncoderConfig};
    use pingproto::constants::PROTOCOL_TOKEN;
    use pingproto::framing::encode_frame;
    use pingproto::negotiation::{
        accepts_pingproto, is_pingproto_response, try_content_encoding, ClientBody, HttpClient,
        ResponseBody, ServerBody,
    };
    use pingproto::stream::{close_all, pipe, Close, NopCloser};

    const HELLO: &[u8] = b"Hello, world\n";

    /// Records whether the transport body was closed.
    #[derive(Clone, Default)]
    struct CloseFlag(Arc<AtomicBool>);

    impl CloseFlag {
        fn is_set(&self) -> bool {
            self.0.load(Ordering::SeqCst)
        }
    }

    impl Close for CloseFlag {
        fn close(&mut self) -> io::Result<()> {
            self.0.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FailingClose(&'static str);

    impl Close for FailingClose {
        fn close(&mut self) -> io::Result<()> {
            Err(io::Error::other(self.0))
        }
    }

    fn fast_pings() -> EncoderConfig {
        EncoderConfig::default().with_ping_interval(Duration::from_millis(1))
    }

    /// Loopback transport: runs a handler in its own thread that idles, pings,
    /// writes `HELLO` and finishes. `upgrade` toggles pingproto support.
    fn loopback(
        upgrade: bool,
        closed: CloseFlag,
        seen_accept: Arc<Mutex<Vec<String>>>,
    ) -> impl Fn(Request<Bytes>) -> io::Result<Response<ResponseBody>> {
        move |request: Request<Bytes>| {
            seen_accept.lock().unwrap().extend(
                request
                    .headers()
                    .get_all(ACCEPT_ENCODING)
                    .iter()
                    .filter_map(|v| v.to_str().ok().map(str::to_owned)),
            );

            let (body_rx, body_tx) = pipe();
            let mut headers = HeaderMap::new();

            let body = if upgrade {
                try_content_encoding(request.headers(), &mut headers, body_tx, &fast_pings())
                    .map_err(io::Error::from)?
            } else {
                ServerBody::Passthrough(body_tx)
            };

            thread::spawn(move || {
                let mut body = body;
                thread::sleep(Duration::from_millis(20));
                body.ping().unwrap();
                body.write_all(HELLO).unwrap();
                let mut tx = body.into_inner().unwrap();
                tx.close().unwrap();
            });

            let mut response = Response::new(ResponseBody::new(body_rx, closed.clone()));
            *response.headers_mut() = headers;
            Ok(response)
        }
    }

// # ✅ 1. Token parsing

    #[test]
    fn accept_encoding_token_matching() {
        let cases: &[(&[&str], bool)] = &[
            (&["pingproto/1.0"], true),
            (&["gzip, pingproto/1.0"], true),
            (&["gzip", "PingProto/1.0"], true),
            (&[" pingproto/1.0 ;q=0.5"], true),
            (&["pingproto/1.0;q=0"], false),
            (&["pingproto/1.0; q=0.000"], false),
            (&["pingproto/1.1"], false),
            (&["gzip, br"], false),
            (&[], false),
        ];

        for (values, expected) in cases {
            let mut headers = HeaderMap::new();
            for v in values.iter() {
                headers.append(ACCEPT_ENCODING, HeaderValue::from_str(v).unwrap());
            }
            assert_eq!(accepts_pingproto(&headers), *expected, "values: {:?}", values);
        }
    }

    #[test]
    fn content_encoding_marker_matching() {
        let mut headers = HeaderMap::new();
        assert!(!is_pingproto_response(&headers));

        headers.insert(CONTENT_ENCODING, HeaderValue::from_static("gzip"));
        assert!(!is_pingproto_response(&headers));

        headers.insert(CONTENT_ENCODING, HeaderValue::from_static(PROTOCOL_TOKEN));
        assert!(is_pingproto_response(&headers));
    }

// # ✅ 2. Server side

    #[test]
    fn server_upgrades_when_advertised() {
        let mut req = HeaderMap::new();
        req.insert(ACCEPT_ENCODING, HeaderValue::from_static(PROTOCOL_TOKEN));
        let mut resp = HeaderMap::new();

        let cfg = EncoderConfig::default().with_ping_interval(Duration::from_secs(3600));
        let mut body = try_content_encoding(&req, &mut resp, Vec::<u8>::new(), &cfg).unwrap();
        assert!(body.is_upgraded());
        assert_eq!(resp.get(CONTENT_ENCODING).unwrap(), PROTOCOL_TOKEN);

        body.write_all(HELLO).unwrap();
        assert_eq!(body.telemetry().unwrap().frames_data, 1);
        body.close().unwrap();

        let wire = body.into_inner().unwrap();
        assert_eq!(wire, encode_frame(HELLO).unwrap());
    }

    #[test]
    fn server_passes_through_when_not_advertised() {
        let mut req = HeaderMap::new();
        req.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip"));
        let mut resp = HeaderMap::new();

        let mut body = try_content_encoding(&req, &mut resp, Vec::<u8>::new(), &fast_pings()).unwrap();
        assert!(!body.is_upgraded());
        assert!(resp.get(CONTENT_ENCODING).is_none());
        assert!(body.telemetry().is_none());

        body.ping().unwrap();
        thread::sleep(Duration::from_millis(10));
        body.write_all(HELLO).unwrap();
        body.close().unwrap();

        assert_eq!(body.into_inner().unwrap(), HELLO);
    }

    /// Counts flushes.
    #[derive(Default)]
    struct FlushCounter {
        data: Vec<u8>,
        flushes: usize,
    }

    impl Write for FlushCounter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            self.flushes += 1;
            Ok(())
        }
    }

    #[test]
    fn passthrough_close_is_a_no_op() {
        let req = HeaderMap::new();
        let mut resp = HeaderMap::new();

        let mut body =
            try_content_encoding(&req, &mut resp, FlushCounter::default(), &fast_pings()).unwrap();
        body.write_all(HELLO).unwrap();
        body.close().unwrap();
        body.close().unwrap();

        let inner = body.into_inner().unwrap();
        assert_eq!(inner.flushes, 0);
        assert_eq!(inner.data, HELLO);
    }

    #[test]
    fn invalid_encoder_config_leaves_no_marker() {
        let mut req = HeaderMap::new();
        req.insert(ACCEPT_ENCODING, HeaderValue::from_static(PROTOCOL_TOKEN));
        let mut resp = HeaderMap::new();

        let cfg = EncoderConfig::default().with_ping_interval(Duration::ZERO);
        assert!(try_content_encoding(&req, &mut resp, Vec::<u8>::new(), &cfg).is_err());
        assert!(resp.get(CONTENT_ENCODING).is_none());
    }

// # ✅ 3. Client side over the loopback

    #[test]
    fn upgraded_response_is_unwrapped_transparently() {
        let closed = CloseFlag::default();
        let seen_accept = Arc::new(Mutex::new(Vec::new()));
        let pings = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&pings);

        let client = HttpClient::with_config(
            loopback(true, closed.clone(), Arc::clone(&seen_accept)),
            DecoderConfig::default().with_ping_hook(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        let response = client.get("http://localhost/stream").unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(CONTENT_ENCODING).is_none());
        assert_eq!(*seen_accept.lock().unwrap(), vec![PROTOCOL_TOKEN.to_string()]);

        let mut body = response.into_body();
        assert!(body.is_decoded());

        let mut out = Vec::new();
        body.read_to_end(&mut out).unwrap();
        assert_eq!(out, HELLO);
        assert!(pings.load(Ordering::SeqCst) >= 1);
        assert_eq!(body.telemetry().unwrap().bytes_payload, HELLO.len() as u64);

        assert!(!closed.is_set());
        body.close().unwrap();
        assert!(closed.is_set());
    }

    #[test]
    fn raw_response_is_byte_identical() {
        let closed = CloseFlag::default();
        let seen_accept = Arc::new(Mutex::new(Vec::new()));
        let client = HttpClient::new(loopback(false, closed.clone(), Arc::clone(&seen_accept)));

        let response = client.get("http://localhost/stream").unwrap();
        assert!(response.headers().get(CONTENT_ENCODING).is_none());

        let mut body = response.into_body();
        assert!(!body.is_decoded());
        assert!(body.telemetry().is_none());

        let mut out = Vec::new();
        body.read_to_end(&mut out).unwrap();
        assert_eq!(out, HELLO);

        body.close().unwrap();
        assert!(closed.is_set());
    }

    #[test]
    fn caller_headers_are_kept() {
        let seen_accept = Arc::new(Mutex::new(Vec::new()));
        let client = HttpClient::new(loopback(false, CloseFlag::default(), Arc::clone(&seen_accept)));

        let request = Request::get("http://localhost/")
            .header(ACCEPT_ENCODING, "gzip")
            .body(Bytes::new())
            .unwrap();
        let mut body = client.send(request).unwrap().into_body();
        io::copy(&mut body, &mut io::sink()).unwrap();

        assert_eq!(
            *seen_accept.lock().unwrap(),
            vec!["gzip".to_string(), PROTOCOL_TOKEN.to_string()]
        );
    }

    #[test]
    fn transport_errors_reach_the_caller() {
        let client = HttpClient::new(|_req: Request<Bytes>| -> io::Result<Response<ResponseBody>> {
            Err(io::Error::new(io::ErrorKind::ConnectionRefused, "no server"))
        });
        let err = client.get("http://localhost/").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::ConnectionRefused);
    }

    #[test]
    fn bad_uri_is_invalid_input() {
        let client = HttpClient::new(|_req: Request<Bytes>| -> io::Result<Response<ResponseBody>> {
            Ok(Response::new(ResponseBody::from_reader(io::empty())))
        });
        let err = client.get("not a uri").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

// # ✅ 4. Composite close

    #[test]
    fn decoded_close_reports_transport_error() {
        let client = HttpClient::new(|_req: Request<Bytes>| -> io::Result<Response<ResponseBody>> {
            let mut response = Response::new(ResponseBody::new(
                Cursor::new(encode_frame(b"x").unwrap()),
                FailingClose("transport close failed"),
            ));
            response
                .headers_mut()
                .insert(CONTENT_ENCODING, HeaderValue::from_static(PROTOCOL_TOKEN));
            Ok(response)
        });

        let mut body = client.get("http://localhost/").unwrap().into_body();
        assert!(matches!(body, ClientBody::Decoded { .. }));

        let err = body.close().unwrap_err();
        assert_eq!(err.to_string(), "transport close failed");

        // The decoder was closed despite the transport failure.
        let mut buf = [0u8; 1];
        assert_eq!(body.read(&mut buf).unwrap_err().kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn close_all_keeps_first_error_and_closes_everything() {
        let flag = CloseFlag::default();
        let mut first = FailingClose("first");
        let mut middle = flag.clone();
        let mut last = FailingClose("last");
        let mut nop = NopCloser(());

        let mut closers: [&mut dyn Close; 4] = [&mut first, &mut middle, &mut last, &mut nop];
        let err = close_all(&mut closers).unwrap_err();

        assert_eq!(err.to_string(), "first");
        assert!(flag.is_set());
    }

    #[test]
    fn close_all_ok_when_nothing_fails() {
        let mut a = CloseFlag::default();
        let mut b = NopCloser(());
        let mut closers: [&mut dyn Close; 2] = [&mut a, &mut b];
        close_all(&mut closers).unwrap();
        assert!(a.is_set());
    }
}
