/*!
    typed read/write access to one controller's object dictionary over one transport.

    [OdClient] owns the connection and everything per-connection: the transaction id
    sequence and the response timeout. It performs no retry on its own, only the caller
    knows whether a stale reply matters, so retry policy belongs to the motion layer.
*/

use core::time::Duration;
use crate::{
    error::{AxisError, AxisResult},
    frame,
    registers::{Object, OdValue},
    socket::GatewaySocket,
    };


/// receive buffer size, gateway replies are far smaller than this
const RECEIVE_MAX: usize = 256;

/// default response timeout for one round trip
pub const RESPONSE_TIMEOUT: Duration = Duration::from_secs(1);

/**
    client of one axis controller's object dictionary

    Every operation is a blocking request/response round trip on the owned socket, there is
    no overlapped I/O within one axis. The struct is not meant to be shared: one connection,
    one exclusive owner.
*/
pub struct OdClient<S> {
    socket: S,
    /// next transaction id, monotonic modulo 65536. The gateway does not echo it meaningfully
    /// but the field must still be populated
    transaction: u16,
    timeout: Duration,
}

impl<S: GatewaySocket> OdClient<S> {
    pub fn new(socket: S) -> Self {
        Self {socket, transaction: 0, timeout: RESPONSE_TIMEOUT}
    }
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }
    /// access to the underlying transport, mostly useful to inspect emulators in tests
    pub fn socket(&mut self) -> &mut S  {&mut self.socket}

    fn next_transaction(&mut self) -> u16 {
        let id = self.transaction;
        self.transaction = self.transaction.wrapping_add(1);
        id
    }

    /// read the typed value of the given object
    pub async fn read<T: OdValue>(&mut self, object: Object<T>) -> AxisResult<T> {
        let raw = self.read_raw(object.index, object.sub, T::SIZE).await?;
        Ok(T::from_raw(raw))
    }
    /// write the typed value of the given object
    pub async fn write<T: OdValue>(&mut self, object: Object<T>, value: T) -> AxisResult<()> {
        self.write_raw(object.index, object.sub, value.to_raw(), T::SIZE).await
    }

    /// read `size` bytes of the object at `index:sub`, as a zero-extended little-endian value
    pub async fn read_raw(&mut self, index: u16, sub: u8, size: u8) -> AxisResult<u64> {
        let request = frame::encode_read(self.next_transaction(), index, sub, size)?;
        let response = self.exchange(&request).await?;
        match frame::decode_response(&response, Some(size))? {
            Some(value) => {
                log::trace!("read {index:#06x}:{sub} = {value:#x}");
                Ok(value)
            }
            // a successful read decode always carries a value
            None => Err(AxisError::ShortResponse(response.len())),
        }
    }
    /// write `size` bytes of the object at `index:sub`
    pub async fn write_raw(&mut self, index: u16, sub: u8, value: u64, size: u8) -> AxisResult<()> {
        let request = frame::encode_write(self.next_transaction(), index, sub, value, size)?;
        let response = self.exchange(&request).await?;
        frame::decode_response(&response, None)?;
        log::trace!("write {index:#06x}:{sub} = {value:#x}");
        Ok(())
    }

    async fn exchange(&mut self, request: &[u8]) -> AxisResult<Vec<u8>> {
        self.socket.send(request).await?;
        let mut buffer = [0; RECEIVE_MAX];
        let received = tokio::time::timeout(self.timeout, self.socket.receive(&mut buffer))
            .await
            .map_err(|_| std::io::Error::new(std::io::ErrorKind::TimedOut, "gateway response timeout"))??;
        Ok(buffer[.. received].to_vec())
    }
}
