// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Unit tests for query orchestration and login over in-memory streams

#[cfg(test)]
mod test {
    use super::super::*;
    use std::cell::Cell;
    use std::io::{self, Cursor, Read, Write};
    use std::rc::Rc;
    use std::sync::{Arc, Mutex};

    const CHALLENGE: &str = "00112233445566778899aabbccddeeff";

    struct MockStream {
        input: Cursor<Vec<u8>>,
        output: Vec<u8>,
        closed: Rc<Cell<bool>>,
    }

    impl MockStream {
        fn new(input: Vec<u8>) -> Self {
            Self {
                input: Cursor::new(input),
                output: Vec::new(),
                closed: Rc::new(Cell::new(false)),
            }
        }
    }

    impl Read for MockStream {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.input.read(buf)
        }
    }

    impl Write for MockStream {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.output.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Transport for MockStream {
        fn close(&mut self) -> io::Result<()> {
            self.closed.set(true);
            Ok(())
        }
    }

    fn sentence(words: &[&str]) -> Vec<u8> {
        let (command, args) = words.split_first().unwrap();
        encode_sentence(command, args, MAX_SENTENCE_LEN).unwrap()
    }

    fn script(sentences: &[&[&str]]) -> Vec<u8> {
        sentences.iter().flat_map(|s| sentence(s)).collect()
    }

    fn unauthenticated(input: Vec<u8>) -> Connection<MockStream> {
        Connection::from_stream(MockStream::new(input), ConnectOptions::default())
    }

    #[derive(Debug)]
    enum HandlerError {
        Api(Error),
        Rejected(&'static str),
    }

    impl From<Error> for HandlerError {
        fn from(e: Error) -> Self {
            Self::Api(e)
        }
    }

    #[test]
    fn test_challenge_login_wire_sequence() {
        let ret = format!("=ret={CHALLENGE}");
        let input = script(&[&["!done", ret.as_str()], &["!done"]]);
        let conn = Connection::establish(
            MockStream::new(input),
            "admin",
            "test",
            ConnectOptions::default(),
        )
        .unwrap();
        assert!(conn.is_authenticated());
        assert_eq!(conn.login_state(), LoginState::Ready);

        let response = format!("=response={}", login_response("test", CHALLENGE).unwrap());
        let mut expected = sentence(&["/login"]);
        expected.extend(sentence(&["/login", "=name=admin", response.as_str()]));
        assert_eq!(conn.stream.output, expected);
    }

    #[test]
    fn test_login_rejected_closes_stream() {
        let ret = format!("=ret={CHALLENGE}");
        let input = script(&[
            &["!done", ret.as_str()],
            &["!trap", "=message=cannot log in"],
        ]);
        let stream = MockStream::new(input);
        let closed = stream.closed.clone();
        let err = Connection::establish(stream, "admin", "wrong", ConnectOptions::default())
            .err()
            .unwrap();
        assert!(matches!(err, Error::Authentication(ref m) if m.contains("cannot log in")));
        assert!(closed.get());
    }

    #[test]
    fn test_login_without_challenge_fails() {
        let mut conn = unauthenticated(script(&[&["!done"]]));
        let err = conn
            .login("admin", "test", LoginMethod::Challenge)
            .unwrap_err();
        assert!(matches!(err, Error::Authentication(_)));
        assert_eq!(conn.login_state(), LoginState::Failed);
        // only the challenge request went out
        assert_eq!(conn.stream.output, sentence(&["/login"]));
    }

    #[test]
    fn test_login_short_challenge_fails() {
        let mut conn = unauthenticated(script(&[&["!done", "=ret=0011"]]));
        let err = conn
            .login("admin", "test", LoginMethod::Challenge)
            .unwrap_err();
        assert!(matches!(err, Error::Authentication(_)));
        assert_eq!(conn.login_state(), LoginState::Failed);
    }

    #[test]
    fn test_plain_login() {
        let mut conn = unauthenticated(script(&[&["!done"]]));
        conn.login("admin", "secret", LoginMethod::Plain).unwrap();
        assert!(conn.is_authenticated());
        assert_eq!(
            conn.stream.output,
            sentence(&["/login", "=name=admin", "=password=secret"])
        );
    }

    #[test]
    fn test_auto_login_answers_legacy_challenge() {
        let ret = format!("=ret={CHALLENGE}");
        let input = script(&[&["!done", ret.as_str()], &["!done"]]);
        let mut conn = unauthenticated(input);
        conn.login("admin", "test", LoginMethod::Auto).unwrap();
        assert!(conn.is_authenticated());

        let response = format!("=response={}", login_response("test", CHALLENGE).unwrap());
        let mut expected = sentence(&["/login", "=name=admin", "=password=test"]);
        expected.extend(sentence(&["/login", "=name=admin", response.as_str()]));
        assert_eq!(conn.stream.output, expected);
    }

    #[test]
    fn test_query_invokes_handler_for_trap() {
        let mut conn = unauthenticated(script(&[&["!trap", "=message=bad command"]]));
        let mut calls = 0;
        let status = conn
            .query("/bogus", &[], |_, reply| -> Result<String> {
                calls += 1;
                let rec = reply.first().unwrap();
                assert_eq!(rec.status(), "trap");
                Ok(rec.get("message").unwrap_or_default().to_string())
            })
            .unwrap();
        assert_eq!(calls, 1);
        assert_eq!(status, "bad command");
    }

    #[test]
    fn test_query_handler_error_passes_through() {
        let mut conn = unauthenticated(script(&[&["!done"]]));
        let err = conn
            .query("/system/identity/print", &[], |_, _| -> std::result::Result<(), HandlerError> {
                Err(HandlerError::Rejected("not interested"))
            })
            .unwrap_err();
        assert!(matches!(err, HandlerError::Rejected("not interested")));
    }

    #[test]
    fn test_query_validation_failure_skips_handler() {
        let mut conn = unauthenticated(script(&[&["!done"]]));
        let mut called = false;
        let err = conn
            .query("/interface/print", &["=name=ether1", ""], |_, _| -> Result<()> {
                called = true;
                Ok(())
            })
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert!(!called);
        assert!(conn.stream.output.is_empty());
    }

    #[test]
    fn test_query_receive_failure_skips_handler() {
        let mut conn = unauthenticated(script(&[&["!re", "=name=ether1"]]));
        let mut called = false;
        let err = conn
            .query("/interface/print", &[], |_, _| -> std::result::Result<(), HandlerError> {
                called = true;
                Ok(())
            })
            .unwrap_err();
        assert!(matches!(err, HandlerError::Api(Error::Io(_))));
        assert!(!called);
    }

    #[test]
    fn test_query_collects_multi_sentence_reply() {
        let mut conn = unauthenticated(script(&[
            &["!re", "=name=ether1", "=running=true"],
            &["!re", "=name=ether2", "=running=false"],
            &["!done"],
        ]));
        let names = conn
            .query("/interface/print", &[], |_, reply| -> Result<Vec<String>> {
                Ok(reply
                    .data()
                    .filter_map(|r| r.get("name"))
                    .map(str::to_string)
                    .collect())
            })
            .unwrap();
        assert_eq!(names, vec!["ether1", "ether2"]);
    }

    #[test]
    fn test_command_maps_trap_to_error() {
        let mut conn = unauthenticated(script(&[&["!trap", "=message=no such command"]]));
        let err = conn.command("/bogus", &[]).unwrap_err();
        assert!(matches!(
            err,
            Error::Trap { ref category, ref message }
                if category == "trap" && message == "no such command"
        ));
    }

    #[test]
    fn test_disconnect_closes_stream() {
        let conn = unauthenticated(Vec::new());
        let closed = conn.stream.closed.clone();
        conn.disconnect().unwrap();
        assert!(closed.get());
    }

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_injected_dispatch_receives_diagnostics() {
        let buf = SharedBuf::default();
        let writer = buf.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let options = ConnectOptions::new().with_dispatch(subscriber);
        let mut conn = Connection::from_stream(MockStream::new(script(&[&["!done"]])), options);
        conn.command("/system/identity/print", &[]).unwrap();

        let logs = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
        assert!(logs.contains("Query '/system/identity/print'"));
    }
}
