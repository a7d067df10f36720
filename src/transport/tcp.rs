use std::time::Duration;
use log::{debug, warn};
use rmodbus::{client::ModbusRequest, guess_response_frame_len, ModbusProto};
use tokio::{io::{AsyncReadExt, AsyncWriteExt}, net::TcpStream};

use crate::config::ModbusProtoConfig;
use crate::meters::FunctionCode;
use super::{registers_to_bytes, Transport, TransportError};

/// Modbus TCP (or RTU framed over TCP) client for one slave.
///
/// The connection is opened on the first read and dropped after any error,
/// the next read reconnects.
pub struct TcpTransport {
    addr: String,
    slave_id: u8,
    proto: ModbusProto,
    timeout: Duration,
    stream: Option<TcpStream>,
}

impl TcpTransport {
    pub fn new(host: &str, port: u16, slave_id: u8, proto: &ModbusProtoConfig, timeout: Duration) -> Self {
        /* if we use RTUoverTCP we need to add all of those fancy CRC stuff */
        let proto = match proto {
            ModbusProtoConfig::TCP => ModbusProto::TcpUdp,
            ModbusProtoConfig::RTUoverTCP => ModbusProto::Rtu,
        };

        return TcpTransport {
            addr: format!("{}:{}", host, port),
            slave_id,
            proto,
            timeout,
            stream: None,
        };
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    async fn connect(&mut self) -> Result<TcpStream, TransportError> {
        let stream = TcpStream::connect(&self.addr).await
            .map_err(|e| TransportError::Connect { addr: self.addr.clone(), source: e })?;
        if let Err(e) = stream.set_nodelay(true) {
            debug!("Unable to set TCP_NODELAY on {}: {}", self.addr, e);
        }
        debug!("Connected to {}", self.addr);
        return Ok(stream);
    }

    async fn exchange(&mut self, function_code: FunctionCode, address: u16, words: u16) -> Result<Vec<u8>, TransportError> {
        let mut stream = match self.stream.take() {
            Some(s) => s,
            None => self.connect().await?,
        };

        let mut mreq = ModbusRequest::new(self.slave_id, self.proto);
        let mut request = Vec::new();

        let generated = match function_code {
            FunctionCode::ReadHoldingRegisters => mreq.generate_get_holdings(address, words, &mut request),
            FunctionCode::ReadInputRegisters => mreq.generate_get_inputs(address, words, &mut request),
        };
        generated.map_err(|e| TransportError::Frame(format!("{:?}", e)))?;

        stream.write_all(&request).await?;

        /* The header is enough to learn the length of the whole frame */
        let header_len = match self.proto {
            ModbusProto::TcpUdp => 6,
            _ => 3,
        };
        let mut response = vec![0u8; header_len];
        read_full(&mut stream, &mut response).await?;

        let len = guess_response_frame_len(&response, self.proto)
            .map_err(|e| TransportError::Frame(format!("{:?}", e)))? as usize;

        if len > header_len {
            let mut rest = vec![0u8; len - header_len];
            read_full(&mut stream, &mut rest).await?;
            response.extend_from_slice(&rest);
        }

        /* A well formed answer may still carry fewer registers than asked for */
        let func_pos = match self.proto {
            ModbusProto::TcpUdp => 7,
            _ => 1,
        };
        if let (Some(func), Some(count)) = (response.get(func_pos), response.get(func_pos + 1)) {
            if func & 0x80 == 0 && *count as usize != words as usize * 2 {
                return Err(TransportError::Length { expected: words, actual: *count as usize / 2 });
            }
        }

        let mut data: Vec<u16> = Vec::new();
        mreq.parse_u16(&response, &mut data)
            .map_err(|e| TransportError::Frame(format!("{:?}", e)))?;

        if data.len() != words as usize {
            return Err(TransportError::Length { expected: words, actual: data.len() });
        }

        self.stream = Some(stream);
        return Ok(registers_to_bytes(&data));
    }
}

async fn read_full(stream: &mut TcpStream, buf: &mut [u8]) -> Result<(), TransportError> {
    match stream.read_exact(buf).await {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Err(TransportError::Closed),
        Err(e) => Err(TransportError::Io(e)),
    }
}

impl Transport for TcpTransport {
    async fn read(&mut self, function_code: FunctionCode, address: u16, words: u16) -> Result<Vec<u8>, TransportError> {
        let limit = self.timeout;
        match tokio::time::timeout(limit, self.exchange(function_code, address, words)).await {
            Ok(Ok(bytes)) => Ok(bytes),
            Ok(Err(e)) => {
                warn!("Reading {} registers at {:#06x} from {} failed: {}", words, address, self.addr, e);
                Err(e)
            }
            Err(_) => {
                /* The stream may hold half a response, never reuse it */
                self.stream = None;
                Err(TransportError::Timeout(limit.as_millis() as u64))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    /// Answers one read holding registers request with the given words
    async fn serve_once(listener: TcpListener, words: Vec<u16>) {
        let (mut sock, _) = listener.accept().await.unwrap();
        let mut req = [0u8; 12];
        sock.read_exact(&mut req).await.unwrap();
        assert_eq!(req[7], 0x03);

        let byte_count = (words.len() * 2) as u8;
        let pdu_len = 3 + byte_count as u16;
        let mut resp = vec![req[0], req[1], 0, 0];
        resp.extend_from_slice(&pdu_len.to_be_bytes());
        resp.push(req[6]);
        resp.push(0x03);
        resp.push(byte_count);
        for w in words {
            resp.extend_from_slice(&w.to_be_bytes());
        }
        sock.write_all(&resp).await.unwrap();
    }

    #[tokio::test]
    async fn test_read_holdings_over_tcp() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = tokio::spawn(serve_once(listener, vec![0x4366, 0x0000]));

        let mut t = TcpTransport::new("127.0.0.1", port, 1, &ModbusProtoConfig::TCP, Duration::from_secs(2));
        let bytes = t.read(FunctionCode::ReadHoldingRegisters, 0x0863, 2).await.unwrap();
        assert_eq!(bytes, vec![0x43, 0x66, 0x00, 0x00]);
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_short_answer_is_length_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = tokio::spawn(serve_once(listener, vec![0x4366]));

        let mut t = TcpTransport::new("127.0.0.1", port, 1, &ModbusProtoConfig::TCP, Duration::from_secs(2));
        let res = t.read(FunctionCode::ReadHoldingRegisters, 0x0863, 2).await;
        assert!(matches!(res, Err(TransportError::Length { expected: 2, actual: 1 })));
        server.await.unwrap();
    }

    fn crc16(frame: &[u8]) -> u16 {
        let mut crc: u16 = 0xFFFF;
        for b in frame {
            crc ^= *b as u16;
            for _ in 0..8 {
                if crc & 1 == 0 {
                    crc >>= 1;
                } else {
                    crc = (crc >> 1) ^ 0xA001;
                }
            }
        }
        crc
    }

    #[tokio::test]
    async fn test_read_inputs_rtu_over_tcp() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut req = [0u8; 8];
            sock.read_exact(&mut req).await.unwrap();
            assert_eq!(req[0], 7);
            assert_eq!(req[1], 0x04);
            assert_eq!(crc16(&req[..6]).to_le_bytes(), [req[6], req[7]]);

            let mut resp = vec![req[0], 0x04, 4, 0x43, 0x66, 0x00, 0x00];
            let crc = crc16(&resp);
            resp.extend_from_slice(&crc.to_le_bytes());
            sock.write_all(&resp).await.unwrap();
        });

        let mut t = TcpTransport::new("127.0.0.1", port, 7, &ModbusProtoConfig::RTUoverTCP, Duration::from_secs(2));
        let bytes = t.read(FunctionCode::ReadInputRegisters, 0x0000, 2).await.unwrap();
        assert_eq!(bytes, vec![0x43, 0x66, 0x00, 0x00]);
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_silent_device_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut req = [0u8; 12];
            sock.read_exact(&mut req).await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let mut t = TcpTransport::new("127.0.0.1", port, 1, &ModbusProtoConfig::TCP, Duration::from_millis(200));
        let res = t.read(FunctionCode::ReadHoldingRegisters, 0x0863, 2).await;
        assert!(matches!(res, Err(TransportError::Timeout(200))));
        server.abort();
    }

    #[tokio::test]
    async fn test_close_after_header() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut req = [0u8; 12];
            sock.read_exact(&mut req).await.unwrap();
            /* Announces seven more bytes, then hangs up */
            sock.write_all(&[req[0], req[1], 0, 0, 0, 7]).await.unwrap();
        });

        let mut t = TcpTransport::new("127.0.0.1", port, 1, &ModbusProtoConfig::TCP, Duration::from_secs(2));
        let res = t.read(FunctionCode::ReadHoldingRegisters, 0x0863, 2).await;
        assert!(matches!(res, Err(TransportError::Closed)));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_connect_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let mut t = TcpTransport::new("127.0.0.1", port, 1, &ModbusProtoConfig::TCP, Duration::from_secs(2));
        let res = t.read(FunctionCode::ReadInputRegisters, 0, 2).await;
        assert!(matches!(res, Err(TransportError::Connect { .. })));
        assert_eq!(t.addr(), format!("127.0.0.1:{port}"));
    }
}
