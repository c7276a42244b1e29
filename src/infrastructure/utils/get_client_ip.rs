use actix_web::dev::ServiceRequest;

/// Extract the client's IP address, considering X-Forwarded-For if trusted.
/// Falls back to the peer address; "unknown" keys still get rate-limited,
/// just as one shared client.
pub fn get_client_ip(req: &ServiceRequest, trust_x_forwarded_for: bool) -> String {
    if trust_x_forwarded_for {
        if let Some(forwarded) = req.headers().get("x-forwarded-for") {
            if let Ok(s) = forwarded.to_str() {
                if let Some(first) = s.split(',').next() {
                    let first = first.trim();
                    if !first.is_empty() {
                        return first.to_string();
                    }
                }
            }
        }
    }
    req.peer_addr()
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
